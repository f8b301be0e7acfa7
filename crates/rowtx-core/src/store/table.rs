///
/// TableDef
///
/// Static description of a keyed table: its name and its named indexes.
/// The first index is the primary key and must be unique; the remaining
/// entries are secondary indexes.
///

#[derive(Clone, Copy, Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub indexes: &'static [IndexDef],
}

impl TableDef {
    #[must_use]
    pub fn primary(&self) -> &'static IndexDef {
        &self.indexes[0]
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<&'static IndexDef> {
        self.indexes.iter().find(|index| index.name == name)
    }
}

///
/// IndexDef
///
/// A named index: the ordered field list forming its key, and whether a
/// full key addresses at most one row.
///

#[derive(Clone, Copy, Debug)]
pub struct IndexDef {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub unique: bool,
}
