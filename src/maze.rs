//! Grid mazes whose phase walls open and close as the player moves.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use log::{debug, info};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::engine::Difficulty;
use crate::error::{AppError, MazeError};

pub const MAX_ENERGY: u32 = 100;
pub const ANCHOR_COST: u32 = 20;
pub const TELEPORT_COST: u32 = 30;
pub const MAX_ANCHORS: usize = 3;

const BUILTIN_LEVELS: [(&str, &str); 3] = [
    (
        "Easy",
        "###########
#P..#.....#
#.#.#.###.#
#.#...#...#
#.#####.#.#
#...~...#E#
###########",
    ),
    (
        "Medium",
        "#############
#P....#.....#
#.###.#.###.#
#...#...#...#
###.#####.#~#
#...~.....#.#
#.#######.#.#
#.......#~..#
#######.###E#
#############",
    ),
    (
        "Hard",
        "###############
#P.#.....~....#
#..#.###.###..#
#.~#...#...#.##
#.##.#.###.#..#
#....#...#.##.#
####.###.#..#.#
#..~...#.##~#.#
#.####.#..#...#
#....~.##.#.#E#
###############",
    ),
];

/// `(row, column)`, row 0 at the top.
pub type Pos = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile
{
    Wall,
    Floor,
    Exit,
    /// Solid on even phases, open on odd ones.
    Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction
{
    Up,
    Down,
    Left,
    Right,
}

impl Direction
{
    fn apply(self, (row, col): Pos) -> Option<Pos>
    {
        match self {
            Direction::Up => Some((row.checked_sub(1)?, col)),
            Direction::Down => Some((row + 1, col)),
            Direction::Left => Some((row, col.checked_sub(1)?)),
            Direction::Right => Some((row, col + 1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze
{
    name: String,
    rows: Vec<Vec<Tile>>,
    start: Pos,
    exit: Pos,
}

impl Maze
{
    /// Lines may differ in width; anything past the end of a line is wall.
    pub fn parse(name: &str, text: &str) -> Result<Self, MazeError>
    {
        let mut rows = Vec::new();
        let mut start = None;
        let mut exit = None;
        for (row, line) in text.lines().enumerate() {
            let mut tiles = Vec::new();
            for (col, ch) in line.trim_end().chars().enumerate() {
                let tile = match ch {
                    '#' => Tile::Wall,
                    '.' | ' ' => Tile::Floor,
                    '~' => Tile::Phase,
                    'P' => {
                        if start.replace((row, col)).is_some() {
                            return Err(MazeError::DuplicateStart);
                        }
                        Tile::Floor
                    }
                    'E' => {
                        exit.get_or_insert((row, col));
                        Tile::Exit
                    }
                    ch => return Err(MazeError::UnknownTile { ch, row: row + 1, col: col + 1 }),
                };
                tiles.push(tile);
            }
            rows.push(tiles);
        }

        Ok(Self {
            name: name.to_string(),
            rows,
            start: start.ok_or(MazeError::MissingStart)?,
            exit: exit.ok_or(MazeError::MissingExit)?,
        })
    }

    pub fn name(&self) -> &str
    {
        &self.name
    }

    pub fn start(&self) -> Pos
    {
        self.start
    }

    pub fn exit(&self) -> Pos
    {
        self.exit
    }

    pub fn height(&self) -> usize
    {
        self.rows.len()
    }

    pub fn width(&self) -> usize
    {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn tile(&self, (row, col): Pos) -> Tile
    {
        self.rows
            .get(row)
            .and_then(|tiles| tiles.get(col))
            .copied()
            .unwrap_or(Tile::Wall)
    }

    pub fn is_open(&self, pos: Pos, phase: u32) -> bool
    {
        match self.tile(pos) {
            Tile::Wall => false,
            Tile::Phase => phase % 2 == 1,
            Tile::Floor | Tile::Exit => true,
        }
    }
}

pub fn builtin_levels() -> Vec<Maze>
{
    BUILTIN_LEVELS
        .iter()
        .filter_map(|(name, text)| Maze::parse(name, text).ok())
        .collect()
}

/// Reads `level1.txt`, `level2.txt`, ... from `dir` until one is missing.
/// Falls back to the built-in levels when the directory has none.
pub fn load_levels(dir: &Path) -> Result<Vec<Maze>, AppError>
{
    let mut levels = Vec::new();
    for number in 1.. {
        let path = dir.join(format!("level{number}.txt"));
        if !path.is_file() {
            break;
        }
        let text = fs::read_to_string(&path).map_err(|source| AppError::Read {
            path: path.clone(),
            source,
        })?;
        let name = format!("Level {number}");
        let maze = Maze::parse(&name, &text).map_err(|source| AppError::Level { name, source })?;
        levels.push(maze);
    }

    if levels.is_empty() {
        info!("no levels in {}, using the built-in levels", dir.display());
        return Ok(builtin_levels());
    }
    info!("loaded {} levels from {}", levels.len(), dir.display());
    Ok(levels)
}

/// Moves between phase shifts.
pub fn phase_interval(difficulty: Difficulty) -> u32
{
    match difficulty {
        Difficulty::Easy => 8,
        Difficulty::Medium => 6,
        Difficulty::Hard => 4,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step
{
    Moved,
    Blocked,
    Exited,
}

/// A player working through one maze.
#[derive(Debug, Clone)]
pub struct MazeRun
{
    maze: Maze,
    position: Pos,
    phase: u32,
    phase_every: u32,
    moves: u32,
    since_shift: u32,
    energy: u32,
    anchors: VecDeque<Pos>,
    finished: bool,
}

impl MazeRun
{
    pub fn new(maze: Maze, difficulty: Difficulty) -> Self
    {
        Self {
            position: maze.start(),
            maze,
            phase: 0,
            phase_every: phase_interval(difficulty),
            moves: 0,
            since_shift: 0,
            energy: MAX_ENERGY,
            anchors: VecDeque::new(),
            finished: false,
        }
    }

    pub fn maze(&self) -> &Maze
    {
        &self.maze
    }

    pub fn phase(&self) -> u32
    {
        self.phase
    }

    pub fn phase_walls_open(&self) -> bool
    {
        self.phase % 2 == 1
    }

    pub fn moves(&self) -> u32
    {
        self.moves
    }

    /// Moves left before the phase walls flip.
    pub fn moves_to_shift(&self) -> u32
    {
        self.phase_every.saturating_sub(self.since_shift)
    }

    pub fn energy(&self) -> u32
    {
        self.energy
    }

    pub fn anchors(&self) -> impl Iterator<Item = Pos> + '_
    {
        self.anchors.iter().copied()
    }

    pub fn is_finished(&self) -> bool
    {
        self.finished
    }

    pub fn step(&mut self, direction: Direction) -> Step
    {
        if self.finished {
            return Step::Exited;
        }
        let target = match direction.apply(self.position) {
            Some(target) if self.maze.is_open(target, self.phase) => target,
            _ => return Step::Blocked,
        };

        self.position = target;
        self.moves += 1;
        self.energy = (self.energy + 1).min(MAX_ENERGY);
        self.advance_phase();

        if target == self.maze.exit() {
            self.finished = true;
            debug!("{} finished in {} moves", self.maze.name(), self.moves);
            return Step::Exited;
        }
        Step::Moved
    }

    /// Remembers the current position; the oldest anchor goes when full.
    pub fn anchor(&mut self) -> Result<(), MazeError>
    {
        self.spend(ANCHOR_COST)?;
        if self.anchors.len() >= MAX_ANCHORS {
            self.anchors.pop_front();
        }
        self.anchors.push_back(self.position);
        Ok(())
    }

    /// Jumps to a random anchor that is open in the current phase.
    pub fn teleport<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Pos, MazeError>
    {
        let open: Vec<Pos> = self
            .anchors
            .iter()
            .copied()
            .filter(|&pos| self.maze.is_open(pos, self.phase))
            .collect();
        let target = *open.choose(rng).ok_or(MazeError::NoAnchor)?;
        self.spend(TELEPORT_COST)?;
        self.position = target;
        Ok(target)
    }

    fn spend(&mut self, cost: u32) -> Result<(), MazeError>
    {
        if self.energy < cost {
            return Err(MazeError::NotEnoughEnergy {
                needed: cost,
                available: self.energy,
            });
        }
        self.energy -= cost;
        Ok(())
    }

    // The shift waits while the player stands on a phase tile.
    fn advance_phase(&mut self)
    {
        self.since_shift += 1;
        if self.since_shift >= self.phase_every && self.maze.tile(self.position) != Tile::Phase {
            self.phase += 1;
            self.since_shift = 0;
        }
    }

    pub fn render(&self) -> Vec<String>
    {
        (0..self.maze.height())
            .map(|row| {
                (0..self.maze.width())
                    .map(|col| {
                        let pos = (row, col);
                        if pos == self.position {
                            '@'
                        } else if self.anchors.contains(&pos) {
                            '*'
                        } else {
                            match self.maze.tile(pos) {
                                Tile::Wall => '#',
                                Tile::Floor => '.',
                                Tile::Exit => 'E',
                                Tile::Phase if self.phase_walls_open() => ':',
                                Tile::Phase => '~',
                            }
                        }
                    })
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    const CORRIDOR: &str = "#######\n#P.~.E#\n#######";

    fn reachable(maze: &Maze, phase: u32) -> bool
    {
        let mut seen = HashSet::from([maze.start()]);
        let mut queue = VecDeque::from([maze.start()]);
        while let Some(pos) = queue.pop_front() {
            if pos == maze.exit() {
                return true;
            }
            for direction in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
                if let Some(next) = direction.apply(pos) {
                    if maze.is_open(next, phase) && seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        false
    }

    #[test]
    fn builtin_levels_are_solvable()
    {
        let levels = builtin_levels();
        assert_eq!(levels.len(), 3);
        for level in &levels {
            assert!(reachable(level, 1), "{}", level.name());
        }
        assert!(reachable(&levels[0], 0));
        assert!(!reachable(&levels[1], 0));
        assert!(!reachable(&levels[2], 0));
    }

    #[test]
    fn parse_errors()
    {
        assert_eq!(Maze::parse("t", "#.E#"), Err(MazeError::MissingStart));
        assert_eq!(Maze::parse("t", "#P.#"), Err(MazeError::MissingExit));
        assert_eq!(Maze::parse("t", "#PP.E#"), Err(MazeError::DuplicateStart));
        assert_eq!(
            Maze::parse("t", "#P.E#\n#x#"),
            Err(MazeError::UnknownTile { ch: 'x', row: 2, col: 2 })
        );
    }

    #[test]
    fn ragged_lines_pad_with_wall()
    {
        let maze = Maze::parse("t", "#####\n#P.E\n###").unwrap();
        assert_eq!(maze.width(), 5);
        assert_eq!(maze.tile((1, 4)), Tile::Wall);
        assert_eq!(maze.tile((9, 9)), Tile::Wall);
    }

    #[test]
    fn walls_block_and_moves_regenerate_energy()
    {
        let maze = Maze::parse("t", CORRIDOR).unwrap();
        let mut run = MazeRun::new(maze, Difficulty::Easy);
        assert_eq!(run.step(Direction::Up), Step::Blocked);
        assert_eq!(run.step(Direction::Left), Step::Blocked);
        assert_eq!(run.moves(), 0);

        run.anchor().unwrap();
        assert_eq!(run.energy(), 80);
        assert_eq!(run.step(Direction::Right), Step::Moved);
        assert_eq!(run.energy(), 81);
        // The phase wall is solid on phase 0.
        assert_eq!(run.step(Direction::Right), Step::Blocked);
    }

    #[test]
    fn phase_walls_open_after_enough_moves()
    {
        let maze = Maze::parse("t", CORRIDOR).unwrap();
        let mut run = MazeRun::new(maze, Difficulty::Hard);
        for _ in 0..2 {
            run.step(Direction::Right);
            run.step(Direction::Left);
        }
        assert_eq!(run.phase(), 1);
        assert!(run.phase_walls_open());
        assert_eq!(run.step(Direction::Right), Step::Moved);
        assert_eq!(run.step(Direction::Right), Step::Moved);
        assert_eq!(run.step(Direction::Right), Step::Moved);
        assert_eq!(run.step(Direction::Right), Step::Exited);
        assert!(run.is_finished());
    }

    #[test]
    fn phase_never_closes_on_the_player()
    {
        let maze = Maze::parse("t", "#####\n#P~E#\n#####").unwrap();
        let mut run = MazeRun::new(maze, Difficulty::Hard);
        run.phase = 1;
        run.since_shift = 3;
        assert_eq!(run.step(Direction::Right), Step::Moved);
        assert_eq!(run.maze().tile(run.position), Tile::Phase);
        assert_eq!(run.phase(), 1);
        assert_eq!(run.step(Direction::Left), Step::Moved);
        assert_eq!(run.phase(), 2);
    }

    #[test]
    fn anchors_and_teleport_spend_energy()
    {
        let maze = Maze::parse("t", "#######\n#P....#\n#....E#\n#######").unwrap();
        let mut run = MazeRun::new(maze, Difficulty::Easy);
        let mut rng = StdRng::seed_from_u64(51);
        assert_eq!(run.teleport(&mut rng), Err(MazeError::NoAnchor));

        for _ in 0..4 {
            run.anchor().unwrap();
            run.step(Direction::Right);
        }
        let anchors: Vec<Pos> = run.anchors().collect();
        assert_eq!(anchors, vec![(1, 2), (1, 3), (1, 4)]);
        assert_eq!(run.energy(), 100 - 4 * 20 + 4);

        assert_eq!(
            run.teleport(&mut rng),
            Err(MazeError::NotEnoughEnergy { needed: 30, available: 24 })
        );
        run.energy = 60;
        let target = run.teleport(&mut rng).unwrap();
        assert!(anchors.contains(&target));
        assert_eq!(run.position, target);
        assert_eq!(run.energy(), 30);
    }

    #[test]
    fn level_directory_loads_in_order()
    {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("level1.txt"), "#####\n#P.E#\n#####\n").unwrap();
        fs::write(dir.path().join("level2.txt"), "####\n#EP#\n####\n").unwrap();
        fs::write(dir.path().join("level4.txt"), "ignored").unwrap();
        let levels = load_levels(dir.path()).unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].name(), "Level 2");
        assert_eq!(levels[1].start(), (1, 2));

        fs::write(dir.path().join("level3.txt"), "#P#").unwrap();
        assert!(matches!(
            load_levels(dir.path()),
            Err(AppError::Level { source: MazeError::MissingExit, .. })
        ));

        let empty = tempfile::tempdir().unwrap();
        assert_eq!(load_levels(empty.path()).unwrap().len(), 3);
    }

    #[test]
    fn render_marks_player_and_anchors()
    {
        let maze = Maze::parse("t", CORRIDOR).unwrap();
        let mut run = MazeRun::new(maze, Difficulty::Easy);
        run.anchor().unwrap();
        run.step(Direction::Right);
        assert_eq!(run.render(), vec!["#######", "#*@~.E#", "#######"]);
    }
}
