use crate::direction::{parse_code, CodeParseError, Direction};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
pub enum Category {
    Offensive,
    Defensive,
    Supply,
    Mission,
    /// Produced by the random code generator, never part of the catalog
    Synthetic,
}

/// A named directional code the player must reproduce
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratagemDefinition {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub code: Vec<Direction>,
}

impl StratagemDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        code: &str,
    ) -> Result<Self, CodeParseError> {
        Ok(Self {
            id: id.into(),
            name: name.into(),
            category,
            code: parse_code(code)?,
        })
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn is_synthetic(&self) -> bool {
        self.category == Category::Synthetic
    }
}

const BUILTIN: &[(&str, &str, Category, &str)] = &[
    ("s_reinforce", "Reinforce", Category::Mission, "UDRLU"),
    ("s_sos", "SOS Beacon", Category::Mission, "UDRU"),
    ("s_resupply", "Resupply", Category::Supply, "DDUR"),
    ("s_eagle_airstrike", "Eagle Airstrike", Category::Offensive, "URDR"),
    ("s_eagle_500kg", "Eagle 500kg Bomb", Category::Offensive, "URDDD"),
    ("s_eagle_cluster", "Eagle Cluster Bomb", Category::Offensive, "URDDR"),
    ("s_orbital_precision", "Orbital Precision Strike", Category::Offensive, "RRU"),
    ("s_orbital_railcannon", "Orbital Railcannon Strike", Category::Offensive, "RULDR"),
    ("s_orbital_laser", "Orbital Laser", Category::Offensive, "RDULR"),
    ("s_hellbomb", "Hellbomb", Category::Mission, "DULDURDU"),
    ("s_autocannon", "AC-8 Autocannon", Category::Supply, "DLDDUR"),
    ("s_railgun", "RS-422 Railgun", Category::Supply, "DRDUUL"),
    ("s_shield_backpack", "SH-32 Shield Generator Pack", Category::Supply, "DULDR"),
    ("s_quasar", "LAS-99 Quasar Cannon", Category::Supply, "DDULR"),
    ("s_sentry_autocannon", "A/AC-8 Autocannon Sentry", Category::Defensive, "DURULU"),
    ("s_sentry_mortar", "A/M-12 Mortar Sentry", Category::Defensive, "DURRD"),
    ("s_jump_pack", "LIFT-850 Jump Pack", Category::Supply, "DUUDU"),
    ("s_eat", "EAT-17 Expendable Anti-Tank", Category::Supply, "DDLUR"),
];

/// Number of entries selected when nothing else is configured
pub const DEFAULT_SELECTION_SIZE: usize = 5;

/// Read-only table of stratagem definitions, loaded once at startup
#[derive(Clone, Debug)]
pub struct Catalog {
    entries: Vec<StratagemDefinition>,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self::from_table(BUILTIN).expect("builtin catalog codes are valid")
    }

    pub fn from_table(table: &[(&str, &str, Category, &str)]) -> Result<Self, CodeParseError> {
        let entries = table
            .iter()
            .map(|&(id, name, category, code)| StratagemDefinition::new(id, name, category, code))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[StratagemDefinition] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&StratagemDefinition> {
        self.entries.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Clone the selected entries, in catalog order
    pub fn pool(&self, selection: &Selection) -> Vec<StratagemDefinition> {
        self.entries
            .iter()
            .filter(|s| selection.contains(&s.id))
            .cloned()
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("unknown stratagem id: {0}")]
    UnknownId(String),

    #[error("at least one stratagem must stay selected")]
    LastSelected,
}

/// Catalog ids eligible for practice
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    pub fn default_for(catalog: &Catalog) -> Self {
        Self {
            ids: catalog
                .entries()
                .iter()
                .take(DEFAULT_SELECTION_SIZE)
                .map(|s| s.id.clone())
                .collect(),
        }
    }

    /// Build a selection from explicit ids. An empty list is accepted and yields
    /// an empty pool.
    pub fn from_ids<I, S>(catalog: &Catalog, ids: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::default();
        for id in ids {
            let id = id.as_ref();
            if !catalog.contains(id) {
                return Err(SelectionError::UnknownId(id.to_string()));
            }
            if !selection.contains(id) {
                selection.ids.push(id.to_string());
            }
        }
        Ok(selection)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Flip one id. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, catalog: &Catalog, id: &str) -> Result<bool, SelectionError> {
        if !catalog.contains(id) {
            return Err(SelectionError::UnknownId(id.to_string()));
        }
        if self.contains(id) {
            if self.ids.len() == 1 {
                return Err(SelectionError::LastSelected);
            }
            self.ids.retain(|s| s != id);
            Ok(false)
        } else {
            self.ids.push(id.to_string());
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_unique_ids_and_codes() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.entries().len(), 18);

        let mut ids: Vec<&str> = catalog.entries().iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 18);

        for s in catalog.entries() {
            assert!(!s.is_empty(), "{} has an empty code", s.id);
            assert!(!s.is_synthetic());
        }
    }

    #[test]
    fn lookup_by_id() {
        let catalog = Catalog::builtin();
        let resupply = catalog.get("s_resupply").unwrap();
        assert_eq!(resupply.name, "Resupply");
        assert_eq!(resupply.category, Category::Supply);
        assert_eq!(
            resupply.code,
            vec![
                Direction::Down,
                Direction::Down,
                Direction::Up,
                Direction::Right
            ]
        );
        assert!(catalog.get("s_missing").is_none());
    }

    #[test]
    fn from_table_rejects_bad_code() {
        let err = Catalog::from_table(&[("x", "X", Category::Mission, "UQ")]).unwrap_err();
        assert_eq!(
            err,
            CodeParseError::InvalidLetter {
                letter: 'Q',
                position: 1
            }
        );
    }

    #[test]
    fn default_selection_takes_first_five() {
        let catalog = Catalog::builtin();
        let selection = Selection::default_for(&catalog);
        assert_eq!(selection.len(), DEFAULT_SELECTION_SIZE);
        assert_eq!(selection.ids()[0], "s_reinforce");

        let pool = catalog.pool(&selection);
        assert_eq!(pool.len(), DEFAULT_SELECTION_SIZE);
        assert_eq!(pool[4].id, "s_eagle_500kg");
    }

    #[test]
    fn from_ids_dedups_and_validates() {
        let catalog = Catalog::builtin();
        let selection = Selection::from_ids(&catalog, ["s_eat", "s_sos", "s_eat"]).unwrap();
        assert_eq!(selection.ids(), ["s_eat".to_string(), "s_sos".to_string()]);

        // Pool follows catalog order, not selection order
        let pool = catalog.pool(&selection);
        assert_eq!(pool[0].id, "s_sos");
        assert_eq!(pool[1].id, "s_eat");

        assert_eq!(
            Selection::from_ids(&catalog, ["nope"]),
            Err(SelectionError::UnknownId("nope".into()))
        );
        assert!(Selection::from_ids(&catalog, Vec::<String>::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn toggle_refuses_to_clear_last_id() {
        let catalog = Catalog::builtin();
        let mut selection = Selection::from_ids(&catalog, ["s_sos"]).unwrap();

        assert_eq!(selection.toggle(&catalog, "s_eat"), Ok(true));
        assert_eq!(selection.toggle(&catalog, "s_sos"), Ok(false));
        assert_eq!(
            selection.toggle(&catalog, "s_eat"),
            Err(SelectionError::LastSelected)
        );
        assert!(selection.contains("s_eat"));
        assert_eq!(
            selection.toggle(&catalog, "bogus"),
            Err(SelectionError::UnknownId("bogus".into()))
        );
    }
}
