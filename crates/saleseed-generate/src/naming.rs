/// Deterministic `prefix + zero-padded index` names. Uniqueness follows from
/// the index alone, so no lookup is needed before inserting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceNamer {
    prefix: &'static str,
    width: usize,
}

pub const USERNAMES: SequenceNamer = SequenceNamer::new("seed_user_", 5);
pub const LAST_NAMES: SequenceNamer = SequenceNamer::new("User", 5);
pub const COMPANY_NAMES: SequenceNamer = SequenceNamer::new("Reseller Company ", 5);
pub const CATEGORY_NAMES: SequenceNamer = SequenceNamer::new("Category ", 3);
pub const SKUS: SequenceNamer = SequenceNamer::new("SKU-", 6);
pub const PRODUCT_NAMES: SequenceNamer = SequenceNamer::new("Product ", 6);
pub const PRODUCT_DESCRIPTIONS: SequenceNamer =
    SequenceNamer::new("Description for product ", 6);

impl SequenceNamer {
    pub const fn new(prefix: &'static str, width: usize) -> Self {
        Self { prefix, width }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    pub fn name(&self, index: u64) -> String {
        format!("{}{:0width$}", self.prefix, index, width = self.width)
    }
}
