use image::Rgb;
use serde::{Deserialize, Serialize};

/// The closed set of labels the engine renders and reasons about.
///
/// Anything else a detector reports is dropped before rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Person,
    Book,
    Table,
    Chair,
}

impl ObjectClass {
    pub const ALL: [ObjectClass; 4] = [
        ObjectClass::Person,
        ObjectClass::Book,
        ObjectClass::Table,
        ObjectClass::Chair,
    ];

    /// Resolve a detector label, case-insensitively. COCO's `dining table`
    /// counts as a table.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        match label.as_str() {
            "person" => Some(ObjectClass::Person),
            "book" => Some(ObjectClass::Book),
            "table" | "dining table" => Some(ObjectClass::Table),
            "chair" => Some(ObjectClass::Chair),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectClass::Person => "person",
            ObjectClass::Book => "book",
            ObjectClass::Table => "table",
            ObjectClass::Chair => "chair",
        }
    }

    /// Classes that may stand in for "someone is seated here".
    pub fn can_mark_seat(&self) -> bool {
        matches!(self, ObjectClass::Chair | ObjectClass::Person)
    }
}

impl std::fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render colors per recognized class, plus caption colors.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassStyle {
    pub person: Rgb<u8>,
    pub book: Rgb<u8>,
    pub table: Rgb<u8>,
    pub chair: Rgb<u8>,
    pub person_count: Rgb<u8>,
    pub occupied: Rgb<u8>,
    pub empty: Rgb<u8>,
}

impl Default for ClassStyle {
    fn default() -> Self {
        Self {
            person: Rgb([0, 255, 0]),
            book: Rgb([0, 0, 255]),
            table: Rgb([255, 0, 0]),
            chair: Rgb([0, 255, 255]),
            person_count: Rgb([255, 255, 255]),
            occupied: Rgb([255, 0, 0]),
            empty: Rgb([0, 255, 0]),
        }
    }
}

impl ClassStyle {
    pub fn color(&self, class: ObjectClass) -> Rgb<u8> {
        match class {
            ObjectClass::Person => self.person,
            ObjectClass::Book => self.book,
            ObjectClass::Table => self.table,
            ObjectClass::Chair => self.chair,
        }
    }

    pub fn occupancy_color(&self, occupied: bool) -> Rgb<u8> {
        if occupied {
            self.occupied
        } else {
            self.empty
        }
    }
}
