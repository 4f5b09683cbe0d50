//! Route decision types: where to go next and what to append first.

use serde::{Deserialize, Serialize};

use crate::state::StateDelta;

use super::registry::END;

/// Next-node selection returned by every node.
///
/// `Fan` is produced when a model issues several tool calls that map to
/// different nodes; the executor schedules every target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goto {
    Node(String),
    Fan(Vec<String>),
    End,
}

impl Goto {
    pub fn node(name: impl Into<String>) -> Self {
        Goto::Node(name.into())
    }

    /// Collapses a list of names: empty or only `__end__` → `End`, one → `Node`,
    /// several → `Fan` with duplicates and `__end__` removed (first occurrence order kept).
    pub fn from_names<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if name == END || out.contains(&name) {
                continue;
            }
            out.push(name);
        }
        match out.len() {
            0 => Goto::End,
            1 => Goto::Node(out.remove(0)),
            _ => Goto::Fan(out),
        }
    }

    /// Target node names; empty for `End`.
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Goto::Node(n) => vec![n.as_str()],
            Goto::Fan(ns) => ns.iter().map(String::as_str).collect(),
            Goto::End => Vec::new(),
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Goto::End)
    }
}

/// Route decision: the delta to append, then the next node(s).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub update: StateDelta,
    pub goto: Goto,
}

impl Command {
    pub fn new(update: impl Into<StateDelta>, goto: Goto) -> Self {
        Self {
            update: update.into(),
            goto,
        }
    }

    /// Route without appending anything.
    pub fn goto(goto: Goto) -> Self {
        Self {
            update: StateDelta::default(),
            goto,
        }
    }

    pub fn end() -> Self {
        Self::goto(Goto::End)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: from_names collapses empty, single and END-only lists.
    #[test]
    fn from_names_collapses() {
        assert_eq!(Goto::from_names(Vec::<String>::new()), Goto::End);
        assert_eq!(Goto::from_names(["order_agent"]), Goto::node("order_agent"));
        assert_eq!(Goto::from_names([END]), Goto::End);
    }

    /// **Scenario**: Several names fan out, deduplicated, order kept, END dropped.
    #[test]
    fn from_names_fans_out_deduplicated() {
        let g = Goto::from_names(["b", "a", "b", END, "c"]);
        assert_eq!(g, Goto::Fan(vec!["b".into(), "a".into(), "c".into()]));
        assert_eq!(g.targets(), vec!["b", "a", "c"]);
    }

    #[test]
    fn end_has_no_targets() {
        assert!(Goto::End.targets().is_empty());
        assert!(Command::end().goto.is_end());
        assert!(Command::end().update.is_empty());
    }
}
