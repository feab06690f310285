use crate::BoundingBox;
use uuid::Uuid;

/// The detector class a detection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    Vehicle,
    Plate,
}

/// Detection represents a bounding box detection in a single frame.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Unique detection identifier
    id: Uuid,
    /// Bounding box in corner format.
    bbox: BoundingBox,
    /// Detection confidence score.
    confidence: f32,
    /// Detector class.
    class: ObjectClass,
    /// Index of the frame this detection was produced for.
    frame_index: u64,
}

impl Detection {
    /// Returns a new Detection
    ///
    /// # Parameters
    ///
    /// * `id`: An optional unique identifier; generated when absent.
    /// * `bbox`: A bounding box object.
    /// * `confidence`: Detection confidence score.
    /// * `class`: Detector class.
    /// * `frame_index`: Frame the detection belongs to.
    pub fn new(
        id: Option<Uuid>,
        bbox: BoundingBox,
        confidence: f32,
        class: ObjectClass,
        frame_index: u64,
    ) -> Detection {
        Detection {
            id: id.unwrap_or_else(Uuid::new_v4),
            bbox,
            confidence,
            class,
            frame_index,
        }
    }

    /// Returns the unique id of the detection
    pub fn id(&self) -> &Uuid {
        &self.id
    }

    /// Returns a BoundingBox of the detection co-ordinates
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Returns the confidence of the detection
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Returns the class of the detection
    pub fn class(&self) -> ObjectClass {
        self.class
    }

    /// Returns the frame index of the detection
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

/// A raw OCR reading for one plate crop.
#[derive(Debug, Clone)]
pub struct TextCandidate {
    /// Raw text as produced by the OCR engine.
    text: String,
    /// OCR confidence score.
    confidence: f32,
    /// Frame the reading was produced for.
    frame_index: u64,
}

impl TextCandidate {
    pub fn new(text: impl Into<String>, confidence: f32, frame_index: u64) -> TextCandidate {
        TextCandidate {
            text: text.into(),
            confidence,
            frame_index,
        }
    }

    /// Returns the raw text of the candidate
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the OCR confidence of the candidate
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Returns the frame index of the candidate
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}
