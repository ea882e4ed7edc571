use super::{CipherKind, morse};
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryFormat
{
    /// Eight bits per character, groups separated by spaces.
    Spaced,
    /// Eight bits per character, no separators.
    Packed,
    /// Two hex digits per character, no separators.
    Hex,
}

/// A cipher kind together with the key needed to encode and decode with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cipher
{
    Caesar { shift: u8 },
    /// `table[i]` is the alphabet index that plain letter `i` becomes.
    Substitution { table: [u8; 26] },
    /// `order[i]` is the plain-text position shown at position `i`.
    Jumble { order: Vec<usize> },
    Morse,
    Binary { format: BinaryFormat },
    Vigenere { key: String },
}

impl Cipher
{
    pub fn kind(&self) -> CipherKind
    {
        match self {
            Cipher::Caesar { .. } => CipherKind::Caesar,
            Cipher::Substitution { .. } => CipherKind::Substitution,
            Cipher::Jumble { .. } => CipherKind::Jumble,
            Cipher::Morse => CipherKind::Morse,
            Cipher::Binary { .. } => CipherKind::Binary,
            Cipher::Vigenere { .. } => CipherKind::Vigenere,
        }
    }

    pub fn encode(&self, text: &str) -> String
    {
        match self {
            Cipher::Caesar { shift } => text.chars().map(|ch| rotate(ch, *shift)).collect(),
            Cipher::Substitution { table } => {
                text.chars().map(|ch| substitute(ch, table)).collect()
            }
            Cipher::Jumble { order } => {
                let chars: Vec<char> = text.chars().collect();
                (0..chars.len())
                    .map(|i| match order.get(i) {
                        Some(&from) if from < chars.len() => chars[from],
                        _ => chars[i],
                    })
                    .collect()
            }
            Cipher::Morse => encode_morse(text),
            Cipher::Binary { format } => encode_binary(text, *format),
            Cipher::Vigenere { key } => vigenere(text, key, true),
        }
    }

    pub fn decode(&self, text: &str) -> Result<String, EngineError>
    {
        match self {
            Cipher::Caesar { shift } => {
                let back = (26 - shift % 26) % 26;
                Ok(text.chars().map(|ch| rotate(ch, back)).collect())
            }
            Cipher::Substitution { table } => {
                let inverse = invert(table);
                Ok(text.chars().map(|ch| substitute(ch, &inverse)).collect())
            }
            Cipher::Jumble { order } => {
                let chars: Vec<char> = text.chars().collect();
                if chars.len() != order.len() {
                    return Err(self.malformed(format!(
                        "expected {} characters, got {}",
                        order.len(),
                        chars.len()
                    )));
                }
                let mut plain = chars.clone();
                for (i, &from) in order.iter().enumerate() {
                    let slot = plain
                        .get_mut(from)
                        .ok_or_else(|| self.malformed(format!("position {from} out of range")))?;
                    *slot = chars[i];
                }
                Ok(plain.into_iter().collect())
            }
            Cipher::Morse => decode_morse(text),
            Cipher::Binary { format } => decode_binary(text, *format),
            Cipher::Vigenere { key } => Ok(vigenere(text, key, false)),
        }
    }

    /// Human readable description of the key, used as a hint.
    pub fn describe_key(&self, answer: &str) -> String
    {
        match self {
            Cipher::Caesar { shift } => format!("Caesar shift: {shift}"),
            Cipher::Substitution { table } => {
                let mut seen = Vec::new();
                for ch in answer.chars().filter(|ch| ch.is_ascii_lowercase()) {
                    if !seen.contains(&ch) {
                        seen.push(ch);
                    }
                    if seen.len() == 3 {
                        break;
                    }
                }
                let pairs: Vec<String> = seen
                    .iter()
                    .map(|&ch| format!("{}->{}", substitute(ch, table), ch))
                    .collect();
                format!("Substitution key: {}", pairs.join(", "))
            }
            Cipher::Jumble { .. } => match answer.chars().next() {
                Some(first) => format!("Jumbled letters, the word starts with '{first}'"),
                None => "Jumbled letters".to_string(),
            },
            Cipher::Morse => {
                "Morse code: letters separated by spaces, words by /".to_string()
            }
            Cipher::Binary { format } => match format {
                BinaryFormat::Spaced => "ASCII in binary, one 8-bit group per letter".to_string(),
                BinaryFormat::Packed => "ASCII in binary, 8 bits per letter, no spaces".to_string(),
                BinaryFormat::Hex => "ASCII in hexadecimal, 2 digits per letter".to_string(),
            },
            Cipher::Vigenere { key } => format!("Vigenere key: '{key}'"),
        }
    }

    fn malformed(&self, reason: String) -> EngineError
    {
        EngineError::MalformedCiphertext {
            kind: self.kind(),
            reason,
        }
    }
}

fn rotate(ch: char, shift: u8) -> char
{
    let base = if ch.is_ascii_lowercase() {
        b'a'
    } else if ch.is_ascii_uppercase() {
        b'A'
    } else {
        return ch;
    };
    let offset = (ch as u8 - base + shift % 26) % 26;
    (base + offset) as char
}

fn substitute(ch: char, table: &[u8; 26]) -> char
{
    if ch.is_ascii_lowercase() {
        (b'a' + table[(ch as u8 - b'a') as usize]) as char
    } else if ch.is_ascii_uppercase() {
        (b'A' + table[(ch as u8 - b'A') as usize]) as char
    } else {
        ch
    }
}

fn invert(table: &[u8; 26]) -> [u8; 26]
{
    let mut inverse = [0u8; 26];
    for (plain, &coded) in table.iter().enumerate() {
        inverse[coded as usize % 26] = plain as u8;
    }
    inverse
}

fn vigenere(text: &str, key: &str, forward: bool) -> String
{
    let shifts: Vec<u8> = key
        .chars()
        .filter(|ch| ch.is_ascii_alphabetic())
        .map(|ch| ch.to_ascii_lowercase() as u8 - b'a')
        .collect();
    if shifts.is_empty() {
        return text.to_string();
    }

    let mut index = 0;
    text.chars()
        .map(|ch| {
            if !ch.is_ascii_alphabetic() {
                return ch;
            }
            let shift = shifts[index % shifts.len()];
            index += 1;
            if forward {
                rotate(ch, shift)
            } else {
                rotate(ch, (26 - shift) % 26)
            }
        })
        .collect()
}

fn encode_morse(text: &str) -> String
{
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter_map(morse::code_for)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(morse::WORD_SEPARATOR)
}

fn decode_morse(text: &str) -> Result<String, EngineError>
{
    let mut words = Vec::new();
    for word in text.split('/') {
        let mut plain = String::new();
        for code in word.split_whitespace() {
            let ch = morse::char_for(code).ok_or_else(|| EngineError::MalformedCiphertext {
                kind: CipherKind::Morse,
                reason: format!("unknown code '{code}'"),
            })?;
            plain.push(ch);
        }
        if !plain.is_empty() {
            words.push(plain);
        }
    }
    Ok(words.join(" "))
}

fn encode_binary(text: &str, format: BinaryFormat) -> String
{
    let groups = text.bytes().map(|byte| match format {
        BinaryFormat::Spaced | BinaryFormat::Packed => format!("{byte:08b}"),
        BinaryFormat::Hex => format!("{byte:02x}"),
    });
    let separator = if format == BinaryFormat::Spaced { " " } else { "" };
    groups.collect::<Vec<_>>().join(separator)
}

fn decode_binary(text: &str, format: BinaryFormat) -> Result<String, EngineError>
{
    let digits: Vec<char> = text.chars().filter(|ch| !ch.is_whitespace()).collect();
    let (width, radix) = match format {
        BinaryFormat::Spaced | BinaryFormat::Packed => (8, 2),
        BinaryFormat::Hex => (2, 16),
    };
    let malformed = |reason: String| EngineError::MalformedCiphertext {
        kind: CipherKind::Binary,
        reason,
    };
    if digits.len() % width != 0 {
        return Err(malformed(format!(
            "{} digits is not a multiple of {width}",
            digits.len()
        )));
    }

    digits
        .chunks(width)
        .map(|chunk| {
            let group: String = chunk.iter().collect();
            let byte = u8::from_str_radix(&group, radix)
                .map_err(|_| malformed(format!("'{group}' is not a valid group")))?;
            if byte.is_ascii() {
                Ok(byte as char)
            } else {
                Err(malformed(format!("'{group}' is not an ASCII character")))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn caesar_shift_three()
    {
        let cipher = Cipher::Caesar { shift: 3 };
        assert_eq!(cipher.encode("HELLO"), "KHOOR");
        assert_eq!(cipher.encode("Hello, World"), "Khoor, Zruog");
        assert_eq!(cipher.decode("KHOOR").unwrap(), "HELLO");
    }

    #[test]
    fn caesar_wraps_around()
    {
        let cipher = Cipher::Caesar { shift: 15 };
        assert_eq!(cipher.decode(&cipher.encode("xyz abc")).unwrap(), "xyz abc");
        assert_eq!(Cipher::Caesar { shift: 1 }.encode("zZ"), "aA");
    }

    #[test]
    fn substitution_inverts()
    {
        let mut table = [0u8; 26];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = ((i + 7) % 26) as u8;
        }
        let cipher = Cipher::Substitution { table };
        let encoded = cipher.encode("secret code");
        assert_eq!(encoded, "zljyla jvkl");
        assert_eq!(cipher.decode(&encoded).unwrap(), "secret code");
    }

    #[test]
    fn jumble_reorders_and_restores()
    {
        let cipher = Cipher::Jumble {
            order: vec![2, 0, 1],
        };
        assert_eq!(cipher.encode("abc"), "cab");
        assert_eq!(cipher.decode("cab").unwrap(), "abc");
    }

    #[test]
    fn jumble_rejects_wrong_length()
    {
        let cipher = Cipher::Jumble {
            order: vec![1, 0],
        };
        assert!(matches!(
            cipher.decode("abc"),
            Err(EngineError::MalformedCiphertext {
                kind: CipherKind::Jumble,
                ..
            })
        ));
    }

    #[test]
    fn morse_sos()
    {
        assert_eq!(Cipher::Morse.encode("SOS"), "... --- ...");
        assert_eq!(Cipher::Morse.decode("... --- ...").unwrap(), "sos");
    }

    #[test]
    fn morse_separates_words()
    {
        let encoded = Cipher::Morse.encode("hi there");
        assert_eq!(encoded, ".... .. / - .... . .-. .");
        assert_eq!(Cipher::Morse.decode(&encoded).unwrap(), "hi there");
    }

    #[test]
    fn morse_rejects_unknown_codes()
    {
        assert!(Cipher::Morse.decode("...... ---").is_err());
    }

    #[test]
    fn binary_formats()
    {
        let spaced = Cipher::Binary {
            format: BinaryFormat::Spaced,
        };
        let packed = Cipher::Binary {
            format: BinaryFormat::Packed,
        };
        let hex = Cipher::Binary {
            format: BinaryFormat::Hex,
        };
        assert_eq!(spaced.encode("hi"), "01101000 01101001");
        assert_eq!(packed.encode("hi"), "0110100001101001");
        assert_eq!(hex.encode("hi"), "6869");
        assert_eq!(spaced.decode("01101000 01101001").unwrap(), "hi");
        assert_eq!(packed.decode("0110100001101001").unwrap(), "hi");
        assert_eq!(hex.decode("6869").unwrap(), "hi");
    }

    #[test]
    fn binary_rejects_partial_groups()
    {
        let packed = Cipher::Binary {
            format: BinaryFormat::Packed,
        };
        assert!(packed.decode("0110100").is_err());
        let hex = Cipher::Binary {
            format: BinaryFormat::Hex,
        };
        assert!(hex.decode("zz").is_err());
        assert!(hex.decode("ff").is_err());
    }

    #[test]
    fn vigenere_lemon()
    {
        let cipher = Cipher::Vigenere {
            key: "lemon".to_string(),
        };
        assert_eq!(cipher.encode("ATTACKATDAWN"), "LXFOPVEFRNHR");
        assert_eq!(cipher.decode("LXFOPVEFRNHR").unwrap(), "ATTACKATDAWN");
    }

    #[test]
    fn vigenere_key_skips_spaces()
    {
        let cipher = Cipher::Vigenere {
            key: "ab".to_string(),
        };
        assert_eq!(cipher.encode("aa aa"), "ab ab");
        assert_eq!(cipher.decode("ab ab").unwrap(), "aa aa");
    }

    #[test]
    fn key_descriptions()
    {
        assert_eq!(
            Cipher::Caesar { shift: 3 }.describe_key("hello"),
            "Caesar shift: 3"
        );
        let mut table = [0u8; 26];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = ((i + 1) % 26) as u8;
        }
        assert_eq!(
            Cipher::Substitution { table }.describe_key("hello"),
            "Substitution key: i->h, f->e, m->l"
        );
    }
}
