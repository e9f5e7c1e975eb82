//! Game records: move sequences stored one game per CSV row.
//!
//! Records seed a tree with known games before any simulation runs. A row
//! holds the moves in play order and nothing else; whether the game ended is
//! decided by replaying it through the rules engine.

use std::{
    fmt::Display,
    fs::File,
    io::{BufReader, Read, Write},
    path::Path,
    str::FromStr,
};

use tracing::debug;

use crate::{
    Error, Result,
    rules::{Outcome, RulesEngine},
    tree::TreeFor,
};

/// One game as a sequence of moves from the start position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord<M> {
    pub moves: Vec<M>,
    /// Result for the side that made the last move, when known
    pub outcome: Option<Outcome>,
}

impl<M> GameRecord<M> {
    pub fn new(moves: Vec<M>) -> Self {
        Self {
            moves,
            outcome: None,
        }
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Parse every row of `reader` into a record. Rows may differ in length.
pub fn read_records<M, Rd>(reader: Rd) -> Result<Vec<GameRecord<M>>>
where
    M: FromStr,
    Rd: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, row) in csv_reader.records().enumerate() {
        let row = row?;
        let moves = row
            .iter()
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(|field| {
                field.parse::<M>().map_err(|_| Error::ParseMove {
                    value: field.to_string(),
                    record: index,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        records.push(GameRecord::new(moves));
    }
    Ok(records)
}

pub fn load_records<M: FromStr>(path: impl AsRef<Path>) -> Result<Vec<GameRecord<M>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Io {
        operation: format!("open game records {}", path.display()),
        source,
    })?;
    let records = read_records(BufReader::new(file))?;
    debug!(path = %path.display(), games = records.len(), "loaded game records");
    Ok(records)
}

/// Write one CSV row of moves per record, without headers.
///
/// Rows carry moves only: [`GameRecord::outcome`] is not written, so a game
/// that stopped before a terminal position reads back with no outcome and is
/// no longer tallied by [`insert_record`].
pub fn write_records<M, W>(writer: W, records: &[GameRecord<M>]) -> Result<()>
where
    M: Display,
    W: Write,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);
    for record in records {
        csv_writer.write_record(record.moves.iter().map(ToString::to_string))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Replay `record` from the tree root, following recorded moves and adding
/// the missing ones.
///
/// When the final position is terminal its outcome is tallied along the
/// replayed path, so a file of finished games also seeds the statistics.
/// Returns the final position.
///
/// # Errors
///
/// Returns [`Error::IllegalMove`] at the first move the rules engine rejects;
/// moves before it stay in the tree.
pub fn insert_record<R: RulesEngine>(
    tree: &mut TreeFor<R>,
    record: &GameRecord<R::Move>,
    rules: &R,
) -> Result<R::Position> {
    let mut position = tree.root().clone();
    let mut path = vec![position.clone()];

    for mv in &record.moves {
        let next = match tree.child_position(&position, mv) {
            Some(known) => known.clone(),
            None => {
                let next = rules.apply_move(&position, mv)?;
                tree.add_child(&position, mv.clone(), &next)?;
                next
            }
        };
        path.push(next.clone());
        position = next;
    }

    let outcome = rules.outcome(&position).or(record.outcome);
    if let Some(outcome) = outcome {
        if rules.is_terminal(&position) {
            tree.mark_terminal(&position, outcome)?;
        }
        if path.len() > 1 {
            tree.record_outcome(&path, outcome)?;
        }
    }
    Ok(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        games::{ScriptedGame, TakeAway},
        rules::History,
        tree::GameTree,
    };

    #[test]
    fn rows_of_different_length_parse() {
        let data = "1,2,1\n3\n\n2, 2\n";
        let records: Vec<GameRecord<u32>> = read_records(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].moves, vec![1, 2, 1]);
        assert_eq!(records[1].moves, vec![3]);
        assert_eq!(records[2].moves, vec![2, 2]);
    }

    #[test]
    fn bad_move_reports_its_row() {
        let data = "1,2\n1,x\n";
        let err = read_records::<u32, _>(data.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::ParseMove { ref value, record: 1 } if value == "x"));
    }

    #[test]
    fn writing_then_reading_keeps_moves() {
        let records = vec![GameRecord::new(vec![1u32, 3]), GameRecord::new(vec![2])];
        let mut buffer = Vec::new();
        write_records(&mut buffer, &records).unwrap();
        assert_eq!(String::from_utf8(buffer.clone()).unwrap(), "1,3\n2\n");
        let back: Vec<GameRecord<u32>> = read_records(buffer.as_slice()).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn written_rows_drop_the_outcome() {
        let records = vec![GameRecord::new(vec![1u32]).with_outcome(Outcome::Draw)];
        let mut buffer = Vec::new();
        write_records(&mut buffer, &records).unwrap();
        let back: Vec<GameRecord<u32>> = read_records(buffer.as_slice()).unwrap();
        assert_eq!(back[0].moves, vec![1]);
        assert_eq!(back[0].outcome, None);
    }

    #[test]
    fn shared_prefixes_reuse_nodes() {
        let rules = History::new(TakeAway::new(3));
        let mut tree = GameTree::new(rules.start(TakeAway::new(3).start(5)));

        insert_record(&mut tree, &GameRecord::new(vec![1, 1]), &rules).unwrap();
        insert_record(&mut tree, &GameRecord::new(vec![1, 2]), &rules).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.node(tree.root_id()).children().len(), 1);
    }

    #[test]
    fn finished_games_are_tallied() {
        let game = ScriptedGame::new("P0")
            .edge("P0", "a", "P1")
            .edge("P1", "b", "P2")
            .terminal("P2", Outcome::Win);
        let mut tree = GameTree::new(game.start());
        let record = GameRecord::new(vec!["a".to_string(), "b".to_string()]);
        let end = insert_record(&mut tree, &record, &game).unwrap();

        assert_eq!(end, "P2");
        let last = tree.get_node(&end).unwrap();
        assert!(last.is_terminal());
        assert_eq!(last.win_count(), 1);
        assert_eq!(tree.get_node(&"P1".to_string()).unwrap().loss_count(), 1);
        assert_eq!(tree.get_node(&game.start()).unwrap().win_count(), 1);
    }

    #[test]
    fn unfinished_games_add_structure_only() {
        let game = TakeAway::new(3);
        let mut tree = GameTree::new(game.start(9));
        insert_record(&mut tree, &GameRecord::new(vec![3, 3]), &game).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.stats().root_visits, 0);
    }

    #[test]
    fn illegal_move_stops_the_replay() {
        let game = TakeAway::new(2);
        let mut tree = GameTree::new(game.start(4));
        let err = insert_record(&mut tree, &GameRecord::new(vec![1, 3]), &game).unwrap_err();
        assert!(matches!(err, Error::IllegalMove { .. }));
        assert_eq!(tree.len(), 2);
    }
}
