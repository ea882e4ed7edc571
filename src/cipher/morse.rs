const TABLE: [(char, &str); 36] = [
    ('a', ".-"),
    ('b', "-..."),
    ('c', "-.-."),
    ('d', "-.."),
    ('e', "."),
    ('f', "..-."),
    ('g', "--."),
    ('h', "...."),
    ('i', ".."),
    ('j', ".---"),
    ('k', "-.-"),
    ('l', ".-.."),
    ('m', "--"),
    ('n', "-."),
    ('o', "---"),
    ('p', ".--."),
    ('q', "--.-"),
    ('r', ".-."),
    ('s', "..."),
    ('t', "-"),
    ('u', "..-"),
    ('v', "...-"),
    ('w', ".--"),
    ('x', "-..-"),
    ('y', "-.--"),
    ('z', "--.."),
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
];

pub const WORD_SEPARATOR: &str = " / ";

pub fn code_for(ch: char) -> Option<&'static str>
{
    let ch = ch.to_ascii_lowercase();
    TABLE
        .iter()
        .find(|(plain, _)| *plain == ch)
        .map(|(_, code)| *code)
}

pub fn char_for(code: &str) -> Option<char>
{
    TABLE
        .iter()
        .find(|(_, known)| *known == code)
        .map(|(plain, _)| *plain)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique()
    {
        let codes: HashSet<&str> = TABLE.iter().map(|(_, code)| *code).collect();
        assert_eq!(codes.len(), TABLE.len());
    }

    #[test]
    fn lookup_is_case_insensitive()
    {
        assert_eq!(code_for('S'), Some("..."));
        assert_eq!(code_for('o'), Some("---"));
        assert_eq!(code_for('7'), Some("--..."));
        assert_eq!(code_for('!'), None);
        assert_eq!(char_for("-.-."), Some('c'));
        assert_eq!(char_for("......"), None);
    }
}
