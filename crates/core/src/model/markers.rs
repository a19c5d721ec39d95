use profscope_protocol::{MarkerPayload, Milliseconds};

use super::tables::{CategoryIndex, StringIndex};

pub type IndexIntoMarkers = usize;

/// One marker row, borrowed from a [`MarkerTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker<'a> {
    pub index: IndexIntoMarkers,
    pub name: StringIndex,
    pub start: Milliseconds,
    /// `None` for instant markers.
    pub end: Option<Milliseconds>,
    pub category: Option<CategoryIndex>,
    pub data: Option<&'a MarkerPayload>,
}

impl Marker<'_> {
    /// `end - start`, or `None` for instant markers.
    pub fn duration(&self) -> Option<Milliseconds> {
        self.end.map(|end| end - self.start)
    }
}

/// Timestamped events that share only the time axis with samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerTable {
    name: Vec<StringIndex>,
    start: Vec<Milliseconds>,
    end: Vec<Option<Milliseconds>>,
    category: Vec<Option<CategoryIndex>>,
    data: Vec<Option<MarkerPayload>>,
}

impl MarkerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        name: StringIndex,
        start: Milliseconds,
        end: Option<Milliseconds>,
        category: Option<CategoryIndex>,
        data: Option<MarkerPayload>,
    ) -> IndexIntoMarkers {
        let index = self.name.len();
        self.name.push(name);
        self.start.push(start);
        self.end.push(end);
        self.category.push(category);
        self.data.push(data);
        index
    }

    pub fn get(&self, index: IndexIntoMarkers) -> Option<Marker<'_>> {
        Some(Marker {
            index,
            name: *self.name.get(index)?,
            start: self.start[index],
            end: self.end[index],
            category: self.category[index],
            data: self.data[index].as_ref(),
        })
    }

    pub fn len(&self) -> usize {
        self.name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Marker<'_>> {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// A new table holding the rows for which `keep` returns true, in order.
    pub fn filter(&self, mut keep: impl FnMut(&Marker<'_>) -> bool) -> Self {
        let mut out = Self::new();
        for marker in self.iter() {
            if keep(&marker) {
                out.push(
                    marker.name,
                    marker.start,
                    marker.end,
                    marker.category,
                    marker.data.cloned(),
                );
            }
        }
        out
    }

    pub fn derive_empty(&self) -> Self {
        Self::new()
    }
}
