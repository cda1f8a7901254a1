//! Sound tables and loadable sound lists

use serde::{Deserialize, Serialize};
use stagehand_core::KeyValueTable;

use crate::channel::Channel;
use crate::manager::SoundManager;

/// Sounds addressable by key or by position
pub type SoundTable<C> = KeyValueTable<String, C>;

/// A table of sounds that installs itself into a manager when loaded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundList<C> {
    /// Sounds in declaration order
    #[serde(default = "empty_table")]
    pub table: SoundTable<C>,
    /// Replace the manager's table on [`attach`](Self::attach)
    #[serde(default = "default_register_on_load")]
    pub register_on_load: bool,
}

fn empty_table<C>() -> SoundTable<C> {
    SoundTable::new()
}

fn default_register_on_load() -> bool {
    true
}

impl<C> SoundList<C> {
    /// Create a list that registers itself on load
    pub fn new(table: SoundTable<C>) -> Self {
        Self {
            table,
            register_on_load: true,
        }
    }

    /// Set whether the list registers itself on load
    pub fn with_register_on_load(mut self, register: bool) -> Self {
        self.register_on_load = register;
        self
    }

    /// Install into `manager`, replacing its table, if `register_on_load` is set
    pub fn attach<Ch>(&self, manager: &mut SoundManager<Ch>) -> bool
    where
        Ch: Channel<Clip = C>,
        C: Clone,
    {
        if !self.register_on_load {
            return false;
        }
        manager.clear_sound_table();
        manager.register_sound_table(self.table.clone());
        log::debug!("Sound list attached ({} sounds)", self.table.count());
        true
    }

    /// Convert every clip, keeping keys and order
    pub fn try_map<D, E, F>(&self, mut convert: F) -> Result<SoundList<D>, E>
    where
        F: FnMut(&C) -> Result<D, E>,
    {
        let mut table = SoundTable::new();
        for (key, clip) in self.table.iter() {
            table.push(key.clone(), convert(clip)?);
        }
        Ok(SoundList {
            table,
            register_on_load: self.register_on_load,
        })
    }
}

impl<C> Default for SoundList<C> {
    fn default() -> Self {
        Self::new(SoundTable::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_defaults() {
        let list: SoundList<String> = serde_json::from_str(
            r#"{"table": [{"key": "se_click", "value": "click.wav"}]}"#,
        )
        .unwrap();
        assert!(list.register_on_load);
        assert_eq!(list.table.get("se_click").map(String::as_str), Ok("click.wav"));
    }

    #[test]
    fn test_try_map() {
        let list = SoundList::new(SoundTable::from_entries([
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "x".to_string()),
        ]));

        let bad: Result<SoundList<u32>, _> = list.try_map(|s| s.parse::<u32>());
        assert!(bad.is_err());

        let lengths: SoundList<usize> = list.try_map(|s| Ok::<_, ()>(s.len())).unwrap();
        assert_eq!(lengths.table.get("b"), Ok(&1));
    }
}
