//! Fixed catalog of the five content classes the model predicts.
//!
//! The catalog is process-wide and read-only: exactly five entries with
//! contiguous identifiers starting at 0, matching the classifier head.

/// Number of output classes of the classifier head.
pub const NUM_CLASSES: usize = 5;

/// A single entry in the class catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassLabel {
    /// Class identifier, equal to the index of the corresponding logit
    pub id: usize,
    /// Display name (Russian, as the model was trained)
    pub name: &'static str,
    /// Display color as a hex string
    pub color: &'static str,
    /// Short description of what the class covers
    pub description: &'static str,
}

/// The catalog itself, indexed by class id.
pub const CLASSES: [ClassLabel; NUM_CLASSES] = [
    ClassLabel {
        id: 0,
        name: "Насилие",
        color: "#ff4444",
        description: "Призывы к физическому насилию, угрозы",
    },
    ClassLabel {
        id: 1,
        name: "Ненависть",
        color: "#ff9944",
        description: "Оскорбления, дискриминация",
    },
    ClassLabel {
        id: 2,
        name: "Суицид",
        color: "#aa44ff",
        description: "Пропаганда или обсуждение самоубийства",
    },
    ClassLabel {
        id: 3,
        name: "Дезинформация",
        color: "#4477ff",
        description: "Намеренно ложная информация",
    },
    ClassLabel {
        id: 4,
        name: "Нейтральный",
        color: "#44ff44",
        description: "Безопасный контент",
    },
];

/// Looks up a catalog entry by class id.
pub fn get(class_id: usize) -> Option<&'static ClassLabel> {
    CLASSES.get(class_id)
}

/// Returns the display name for a class id, or a placeholder for an id
/// outside the catalog.
pub fn name(class_id: usize) -> &'static str {
    get(class_id).map(|c| c.name).unwrap_or("?")
}
