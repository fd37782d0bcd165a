use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::bag::Bag;
use super::board::{Board, Tile};
use super::util::{Direction, Position};
use super::word_index::WordIndex;
use super::SolveConfig;

/// Best grid found by a solve, with the number of hand tiles it failed to
/// place. Zero leftover means a perfect solve.
#[derive(Debug)]
pub struct Solution {
    pub board: Board,
    pub leftover: u32,
}

/// One entry on the exploration stack. Owns its grid, bag and frontier so
/// sibling branches never share mutable state.
struct SearchState {
    board: Board,
    bag: Bag,
    frontier: Vec<Position>,
    depth: usize,
}

impl SearchState {
    /// Canonical key over grid contents plus remaining bag, so the same
    /// configuration reached through a different move order is pruned.
    fn key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(64);
        self.board.fingerprint(&mut key);
        key.push(b'|');
        key.extend_from_slice(self.bag.counts());
        key
    }
}

fn push_state(stack: &mut Vec<SearchState>, seen: &mut HashSet<Vec<u8>>, state: SearchState) {
    if seen.insert(state.key()) {
        stack.push(state);
    }
}

/// Rough count of new tiles a trial placement would take from the bag, or -1
/// when the word cannot fit there at all. Deliberately cheap; it only orders
/// candidates and need not agree with the exact demand.
fn rough_need(board: &Board, word: &str, row: i32, col: i32, dir: Direction) -> i32 {
    if row < 0 || col < 0 {
        return -1;
    }
    let len = word.chars().count() as i32;
    match dir {
        Direction::Down => {
            if row + len > board.height() as i32 || col >= board.width() as i32 {
                return -1;
            }
        }
        Direction::Across => {
            if col + len > board.width() as i32 || row >= board.height() as i32 {
                return -1;
            }
        }
    }

    let mut need = 0;
    for i in 0..len {
        let (r, c) = dir.advance(row, col, i);
        if !board.occupied(r, c) {
            need += 1;
        }
    }
    need
}

/// With probability `temperature`, forget the heuristic order and shuffle.
fn maybe_shuffle<T, R: Rng>(items: &mut [T], temperature: f64, rng: &mut R) {
    if temperature <= 0.0 {
        return;
    }
    if rng.gen::<f64>() < temperature {
        items.shuffle(rng);
    }
}

/// Depth-first exploration of everything reachable from one seed word laid
/// across the grid center. Returns the best board found and its leftover
/// count, or None when the seed itself cannot be placed. Sets `stop` once a
/// perfect solve is found so sibling seeds can quit early.
fn explore_seed<R: Rng>(
    index: &WordIndex,
    config: &SolveConfig,
    seed: &str,
    hand: &Bag,
    rng: &mut R,
    stop: &AtomicBool,
) -> Option<(Board, u32)> {
    let blank = Board::new(config.width, config.height);
    let centre_row = (config.height / 2) as i32;
    let start_col = (config.width / 2) as i32 - (seed.chars().count() / 2) as i32;
    if start_col < 0 || start_col + seed.chars().count() as i32 > config.width as i32 {
        return None;
    }

    let need = blank.needed(seed, centre_row, start_col, Direction::Across);
    if !hand.covers(&need) {
        return None;
    }

    let bag = hand.pay(&need);
    let board = blank.place(seed, centre_row, start_col, Direction::Across);
    let frontier: Vec<Position> = (0..seed.chars().count())
        .map(|i| Position {
            row: centre_row as usize,
            col: start_col as usize + i,
        })
        .collect();

    log::debug!("seeding with {seed:?}");

    let mut seen: HashSet<Vec<u8>> = HashSet::new();
    let mut stack: Vec<SearchState> = Vec::new();
    push_state(
        &mut stack,
        &mut seen,
        SearchState {
            board,
            bag,
            frontier,
            depth: 0,
        },
    );

    let mut best: Option<(Board, u32)> = None;
    let mut best_left = hand.total();
    let mut explored = 0usize;

    while let Some(state) = stack.pop() {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        explored += 1;
        if explored > config.max_states {
            log::debug!("seed {seed:?} hit the state ceiling, abandoning it");
            break;
        }

        let SearchState {
            board,
            bag,
            mut frontier,
            depth,
        } = state;

        let remaining = bag.total();
        if remaining < best_left {
            best_left = remaining;
            best = Some((board.clone(), remaining));
            log::debug!("{:indent$}new best: {remaining} tile(s) left", "", indent = depth * 2);
            if remaining == 0 {
                stop.store(true, Ordering::Relaxed);
                break;
            }
        }

        // Most constrained anchor first: fewest indexed words for its letter.
        frontier.sort_by_key(|&pos| match board[pos] {
            Tile::Letter(ch) => index.candidate_count(ch),
            Tile::Empty => 0,
        });
        let anchor = match frontier.first() {
            Some(&pos) => pos,
            None => continue,
        };
        let anchor_ch = match board[anchor] {
            Tile::Letter(ch) => ch,
            Tile::Empty => continue,
        };
        let (ar, ac) = (anchor.row as i32, anchor.col as i32);

        // Expensive candidates go first so the cheap ones, pushed last, are
        // popped first.
        let mut pool: Vec<(usize, usize)> = index.candidates(anchor_ch).to_vec();
        pool.sort_by_key(|&(id, offset)| {
            let word = index.word(id);
            let down = rough_need(&board, word, ar - offset as i32, ac, Direction::Down);
            let across = rough_need(&board, word, ar, ac - offset as i32, Direction::Across);
            std::cmp::Reverse(down.max(across))
        });
        maybe_shuffle(&mut pool, config.temperature, rng);

        for (id, offset) in pool {
            let word = index.word(id);
            let mut dirs = [Direction::Across, Direction::Down];
            maybe_shuffle(&mut dirs, config.temperature, rng);

            for dir in dirs {
                let (row, col) = match dir {
                    Direction::Across => (ar, ac - offset as i32),
                    Direction::Down => (ar - offset as i32, ac),
                };
                if !board.can_place(word, row, col, dir, true) {
                    continue;
                }
                let need = board.needed(word, row, col, dir);
                if !bag.covers(&need) {
                    continue;
                }

                let next_bag = bag.pay(&need);
                let next_board = board.place(word, row, col, dir);
                let mut next_frontier = frontier.clone();
                for i in 0..word.chars().count() {
                    let (r, c) = dir.advance(row, col, i as i32);
                    if !board.occupied(r, c) {
                        next_frontier.push(Position {
                            row: r as usize,
                            col: c as usize,
                        });
                    }
                }

                push_state(
                    &mut stack,
                    &mut seen,
                    SearchState {
                        board: next_board,
                        bag: next_bag,
                        frontier: next_frontier,
                        depth: depth + 1,
                    },
                );
            }
        }
    }

    log::debug!("seed {seed:?}: explored {explored} state(s)");
    best
}

/// Deposits hand tiles missing from the board into its empty cells, row-major
/// from the top-left, so the player can still see them. Purely cosmetic: no
/// legality checking, and the leftover count is unaffected.
pub fn park_leftovers(board: &mut Board, hand: &Bag) {
    let mut unused = hand.clone();
    let placed: Vec<char> = board.letters().collect();
    for ch in placed {
        unused.remove(ch);
    }

    let spots: Vec<Position> = board.empty_positions().collect();
    for (ch, pos) in unused.letters().zip(spots) {
        board.set(pos, ch);
    }
}

/// Heuristic placement search over one dictionary index. Each solve call owns
/// all of its bookkeeping, so solvers can be reused or run side by side.
pub struct Solver<'a, R: Rng> {
    index: &'a WordIndex,
    config: SolveConfig,
    rng: R,
}

impl<'a> Solver<'a, StdRng> {
    pub fn new(index: &'a WordIndex, config: SolveConfig) -> Self {
        Self::with_rng(index, config, StdRng::from_entropy())
    }

    /// Solver with a fixed RNG seed, for reproducible runs.
    pub fn seeded(index: &'a WordIndex, config: SolveConfig, seed: u64) -> Self {
        Self::with_rng(index, config, StdRng::seed_from_u64(seed))
    }
}

impl<'a, R: Rng> Solver<'a, R> {
    pub fn with_rng(index: &'a WordIndex, config: SolveConfig, rng: R) -> Self {
        Self { index, config, rng }
    }

    /// Tries every affordable seed word, longest first, and keeps the board
    /// with the fewest tiles left in hand. Stops as soon as a seed solves the
    /// hand perfectly.
    pub fn solve(&mut self, hand: &Bag) -> Solution {
        let mut best_board = Board::new(self.config.width, self.config.height);
        let mut best_left = hand.total();
        if hand.is_empty() {
            return Solution {
                board: best_board,
                leftover: 0,
            };
        }

        let stop = AtomicBool::new(false);
        for id in self.index.affordable_words(hand) {
            let seed = self.index.word(id);
            if let Some((board, left)) =
                explore_seed(self.index, &self.config, seed, hand, &mut self.rng, &stop)
            {
                if left < best_left {
                    best_left = left;
                    best_board = board;
                }
            }
            if stop.load(Ordering::Relaxed) {
                break;
            }
        }

        park_leftovers(&mut best_board, hand);
        Solution {
            board: best_board,
            leftover: best_left,
        }
    }

    /// Like `solve`, but fans the independent seed subtrees out across a
    /// thread pool. A shared stop flag lets the first perfect solve cancel
    /// the rest; ties on leftover go to the earliest seed so repeated runs
    /// with the same RNG seeds agree.
    pub fn solve_parallel(&mut self, hand: &Bag) -> Solution {
        let mut best_board = Board::new(self.config.width, self.config.height);
        let mut best_left = hand.total();
        if hand.is_empty() {
            return Solution {
                board: best_board,
                leftover: 0,
            };
        }

        let seeds: Vec<(usize, u64)> = self
            .index
            .affordable_words(hand)
            .into_iter()
            .map(|id| (id, self.rng.gen()))
            .collect();

        let index = self.index;
        let config = &self.config;
        let stop = AtomicBool::new(false);
        let results: Vec<(usize, Board, u32)> = seeds
            .into_par_iter()
            .enumerate()
            .filter_map(|(order, (id, rng_seed))| {
                let mut rng = StdRng::seed_from_u64(rng_seed);
                explore_seed(index, config, index.word(id), hand, &mut rng, &stop)
                    .map(|(board, left)| (order, board, left))
            })
            .collect();

        if let Some((_, board, left)) = results.into_iter().min_by_key(|r| (r.2, r.0)) {
            if left < best_left {
                best_left = left;
                best_board = board;
            }
        }

        park_leftovers(&mut best_board, hand);
        Solution {
            board: best_board,
            leftover: best_left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(words: &[&str]) -> WordIndex {
        WordIndex::new(words.iter().map(|w| w.to_string()).collect())
    }

    fn greedy_config() -> SolveConfig {
        SolveConfig {
            temperature: 0.0,
            ..SolveConfig::default()
        }
    }

    fn board_letters(board: &Board) -> Bag {
        board.letters().collect()
    }

    fn flush_run(run: &mut String, runs: &mut Vec<String>) {
        if run.len() >= 2 {
            runs.push(std::mem::take(run));
        } else {
            run.clear();
        }
    }

    /// Every maximal run of two or more letters, read across and down, must
    /// be a dictionary word.
    fn assert_all_runs_are_words(board: &Board, words: &[&str]) {
        let mut runs: Vec<String> = Vec::new();
        for row in 0..board.height() {
            let mut run = String::new();
            for col in 0..board.width() {
                match board.letter(Position { row, col }) {
                    Some(ch) => run.push(ch),
                    None => flush_run(&mut run, &mut runs),
                }
            }
            flush_run(&mut run, &mut runs);
        }
        for col in 0..board.width() {
            let mut run = String::new();
            for row in 0..board.height() {
                match board.letter(Position { row, col }) {
                    Some(ch) => run.push(ch),
                    None => flush_run(&mut run, &mut runs),
                }
            }
            flush_run(&mut run, &mut runs);
        }
        for run in runs {
            assert!(words.contains(&run.as_str()), "{run:?} is not a word");
        }
    }

    #[test]
    fn test_single_word_solves_perfectly_at_center() {
        let index = index(&["apple"]);
        let hand: Bag = "apple".chars().collect();
        let mut solver = Solver::seeded(&index, greedy_config(), 1);
        let solution = solver.solve(&hand);

        assert_eq!(solution.leftover, 0);
        assert_eq!(solution.board.letters().count(), 5);
        for (i, ch) in "apple".chars().enumerate() {
            assert_eq!(solution.board.letter(Position { row: 10, col: 8 + i }), Some(ch));
        }
    }

    #[test]
    fn test_unusable_hand_parks_tiles_top_left() {
        let index = index(&["apple", "peel"]);
        let hand: Bag = "xqz".chars().collect();
        let mut solver = Solver::seeded(&index, greedy_config(), 1);
        let solution = solver.solve(&hand);

        assert_eq!(solution.leftover, 3);
        let parked: Vec<Option<char>> = (0..3)
            .map(|col| solution.board.letter(Position { row: 0, col }))
            .collect();
        assert_eq!(parked, vec![Some('q'), Some('x'), Some('z')]);
        assert_eq!(solution.board.letters().count(), 3);
    }

    #[test]
    fn test_two_words_cross_on_shared_letter() {
        let words = ["peel", "swap", "eel"];
        let index = index(&words);
        let hand: Bag = "peelswa".chars().collect();
        let mut solver = Solver::seeded(&index, greedy_config(), 1);
        let solution = solver.solve(&hand);

        assert_eq!(solution.leftover, 0);
        // "peel" seeds the middle row, "swap" hangs off its 'p'
        for (i, ch) in "peel".chars().enumerate() {
            assert_eq!(solution.board.letter(Position { row: 10, col: 8 + i }), Some(ch));
        }
        for (i, ch) in "swap".chars().enumerate() {
            assert_eq!(solution.board.letter(Position { row: 7 + i, col: 8 }), Some(ch));
        }
        assert_eq!(board_letters(&solution.board), hand);
        assert_all_runs_are_words(&solution.board, &words);
    }

    #[test]
    fn test_empty_hand_is_a_noop_solve() {
        let index = index(&["apple"]);
        let hand = Bag::new();
        let mut solver = Solver::seeded(&index, greedy_config(), 1);
        let solution = solver.solve(&hand);

        assert_eq!(solution.leftover, 0);
        assert_eq!(solution.board.letters().count(), 0);
    }

    #[test]
    fn test_every_hand_tile_ends_up_on_the_board() {
        let index = index(&["apple", "banana", "orange", "pear", "grape", "peel", "split", "dump", "swap"]);
        let hand: Bag = "dumpsplit".chars().collect();
        let mut solver = Solver::seeded(&index, greedy_config(), 1);
        let solution = solver.solve(&hand);

        // "split" always seeds, so at worst the other four tiles are left
        assert!(solution.leftover <= 4);
        // parked or placed, the hand is conserved on the final board
        assert_eq!(board_letters(&solution.board), hand);
    }

    #[test]
    fn test_state_ceiling_caps_each_seed() {
        let index = index(&["peel", "swap", "eel"]);
        let hand: Bag = "peelswa".chars().collect();
        let config = SolveConfig {
            max_states: 1,
            ..greedy_config()
        };
        let mut solver = Solver::seeded(&index, config, 1);
        let solution = solver.solve(&hand);

        // only the seed states themselves are examined, so the crossing that
        // would finish the hand is never reached
        assert_eq!(solution.leftover, 3);
    }

    #[test]
    fn test_grid_dimensions_are_respected() {
        let index = index(&["apple"]);
        let hand: Bag = "apple".chars().collect();
        let config = SolveConfig {
            width: 3,
            height: 3,
            ..greedy_config()
        };
        let mut solver = Solver::seeded(&index, config, 1);
        let solution = solver.solve(&hand);

        // the seed cannot fit, so everything is parked on the tiny grid
        assert_eq!(solution.board.width(), 3);
        assert_eq!(solution.board.height(), 3);
        assert_eq!(solution.leftover, 5);
        assert_eq!(solution.board.letters().count(), 5);
    }

    #[test]
    fn test_same_rng_seed_reproduces_the_same_board() {
        let index = index(&["apple", "banana", "orange", "pear", "grape", "peel", "split", "dump", "swap"]);
        let hand: Bag = "dumpsplit".chars().collect();

        let first = Solver::seeded(&index, SolveConfig::default(), 42).solve(&hand);
        let second = Solver::seeded(&index, SolveConfig::default(), 42).solve(&hand);

        assert_eq!(first.leftover, second.leftover);
        assert_eq!(first.board, second.board);
    }

    #[test]
    fn test_parallel_solve_finds_the_same_perfect_result() {
        let index = index(&["peel", "swap", "eel"]);
        let hand: Bag = "peelswa".chars().collect();
        let mut solver = Solver::seeded(&index, greedy_config(), 1);
        let solution = solver.solve_parallel(&hand);

        assert_eq!(solution.leftover, 0);
        assert_eq!(board_letters(&solution.board), hand);
    }

    #[test]
    fn test_park_leftovers_skips_occupied_and_stops_when_full() {
        let mut board = Board::new(2, 2);
        board.set(Position { row: 0, col: 1 }, 'z');
        let hand: Bag = "abcdz".chars().collect();
        park_leftovers(&mut board, &hand);

        // a, b, c fill the three free cells in scan order; d has nowhere to go
        assert_eq!(board.letter(Position { row: 0, col: 0 }), Some('a'));
        assert_eq!(board.letter(Position { row: 0, col: 1 }), Some('z'));
        assert_eq!(board.letter(Position { row: 1, col: 0 }), Some('b'));
        assert_eq!(board.letter(Position { row: 1, col: 1 }), Some('c'));
    }

    #[test]
    fn test_maybe_shuffle_zero_temperature_keeps_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut items = vec![1, 2, 3, 4, 5];
        maybe_shuffle(&mut items, 0.0, &mut rng);
        assert_eq!(items, vec![1, 2, 3, 4, 5]);

        // at full temperature the contents survive even when the order may not
        let mut items = vec![1, 2, 3, 4, 5];
        maybe_shuffle(&mut items, 1.0, &mut rng);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
    }
}
