use serde::Serialize;

/// One heading seen during a render pass.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct HeadingRecord {
    pub level: u8,
    pub title: String,
    pub slug: String,
    pub counter: String,
}

impl HeadingRecord {
    pub fn new(
        level: u8,
        title: impl Into<String>,
        slug: impl Into<String>,
        counter: impl Into<String>,
    ) -> Self {
        Self {
            level,
            title: title.into(),
            slug: slug.into(),
            counter: counter.into(),
        }
    }
}

/// Append-only log of headings in document order. Written by heading rendering,
/// read by the table-of-contents builder.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HeadingRegistry {
    records: Vec<HeadingRecord>,
}

impl HeadingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: HeadingRecord) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn as_slice(&self) -> &[HeadingRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeadingRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a HeadingRegistry {
    type Item = &'a HeadingRecord;
    type IntoIter = std::slice::Iter<'a, HeadingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<HeadingRecord> for HeadingRegistry {
    fn from_iter<I: IntoIterator<Item = HeadingRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
