// ============================================================
// ROW SHAPE ENUM
// ============================================================
// Which of the two exported column layouts a CSV file uses

/// Column layout of an exported exam dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// `ID, Question, Chose_A..Chose_E (or Answer_A..E), Answered|Correct, Explain`
    /// Correctness is structured `voted_answers` data or a short letter list.
    ExamDump,

    /// `No, Content, A, B, C, D, Answered`
    /// Correctness and explanation live together in markdown prose.
    MarkdownAnswered,
}

const OPTION_LETTERS: [char; 5] = ['A', 'B', 'C', 'D', 'E'];

impl RowShape {
    /// Detect the shape from trimmed header names.
    ///
    /// The content column decides; `ID` alone only marks an exam dump when
    /// neither `Question` nor `Content` is present.
    pub fn detect(headers: &[&str]) -> Option<Self> {
        let has = |name: &str| headers.iter().any(|h| *h == name);

        if has("Question") {
            Some(RowShape::ExamDump)
        } else if has("Content") {
            Some(RowShape::MarkdownAnswered)
        } else if has("ID") {
            Some(RowShape::ExamDump)
        } else {
            None
        }
    }

    /// Option letters in the order answers are emitted
    pub fn option_letters(&self) -> &'static [char] {
        &OPTION_LETTERS
    }

    pub fn id_columns(&self) -> &'static [&'static str] {
        match self {
            RowShape::ExamDump => &["ID"],
            RowShape::MarkdownAnswered => &["No", "ID"],
        }
    }

    pub fn content_columns(&self) -> &'static [&'static str] {
        match self {
            RowShape::ExamDump => &["Question"],
            RowShape::MarkdownAnswered => &["Content"],
        }
    }

    /// Candidate column names for one option letter, in lookup order
    pub fn option_columns(&self, letter: char) -> Vec<String> {
        match self {
            RowShape::ExamDump => vec![format!("Chose_{}", letter), format!("Answer_{}", letter)],
            RowShape::MarkdownAnswered => vec![letter.to_string()],
        }
    }

    pub fn correctness_columns(&self) -> &'static [&'static str] {
        match self {
            RowShape::ExamDump => &["Answered", "Correct", "Correct_Answers"],
            RowShape::MarkdownAnswered => &["Answered"],
        }
    }

    /// Dedicated explanation columns; empty when the explanation is embedded
    /// in the correctness annotation
    pub fn explanation_columns(&self) -> &'static [&'static str] {
        match self {
            RowShape::ExamDump => &["Explain", "Explanation"],
            RowShape::MarkdownAnswered => &[],
        }
    }
}

impl std::fmt::Display for RowShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowShape::ExamDump => write!(f, "ExamDump"),
            RowShape::MarkdownAnswered => write!(f, "MarkdownAnswered"),
        }
    }
}
