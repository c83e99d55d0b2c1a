pub type GSym = symbol_table::GlobalSymbol;

/// An interned identifier used for predicate names, object names, fact names,
/// operator names and synthetic names (e.g. `"NOT:p;q;r"`).
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct Id {
    sym: GSym,
}

impl Id {
    pub fn new<S: ToString>(s: S) -> Self {
        Self {
            sym: GSym::from(s.to_string()),
        }
    }
}

impl Default for Id {
    fn default() -> Self {
        Id::new("")
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sym)
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        self.sym.as_str()
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::new(s)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrips_display() {
        let a = Id::from("at");
        let b = Id::from("at");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "at");
    }

    #[test]
    fn distinct_names_are_distinct() {
        assert_ne!(Id::from("at"), Id::from("in"));
    }
}
