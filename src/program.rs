//! This module contains types useful for dealing with concrete programs that
//! you want to analyze.

use std::{fs::File, io::Read, path::Path};

use anyhow::anyhow;
use bimap::BiMap;

use crate::instruction::{ExecutionMode, Instruction};

/// The source text of a program, together with the name it is reported under.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Source {
    name: String,
    text: String,
}

impl Source {
    /// Creates a new source from the provided `name` and `text`.
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Creates a new source by reading the UTF-8 file at the provided `path`.
    ///
    /// The file name (without its parent directories) becomes the program
    /// name used in reports.
    pub fn new_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|_| anyhow!("File not available"))?;
        let mut text = String::new();
        file.read_to_string(&mut text)
            .map_err(|_| anyhow!("File could not be read"))?;

        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into());

        Ok(Self { name, text })
    }

    /// The name the program is reported under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A parsed program: the typed instruction stream, the label table, the
/// declared language version, and the detected execution mode.
///
/// Programs are immutable once parsing completes.
#[derive(Clone, Debug)]
pub struct Program {
    name:         String,
    instructions: Vec<Instruction>,
    labels:       BiMap<String, usize>,
    version:      u8,
    mode:         ExecutionMode,
}

impl Program {
    /// Assembles a program from the parser's outputs.
    ///
    /// This is intended to be called by [`crate::parser::parse`]; the parser
    /// is responsible for having validated the inputs against one another.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        instructions: Vec<Instruction>,
        labels: BiMap<String, usize>,
        version: u8,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            name: name.into(),
            instructions,
            labels,
            version,
            mode,
        }
    }

    /// The name the program is reported under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The typed instruction stream in source order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Resolves a label name to the index of the instruction it precedes.
    #[must_use]
    pub fn label_target(&self, label: &str) -> Option<usize> {
        self.labels.get_by_left(label).copied()
    }

    /// Resolves an instruction index back to the label defined at it, if any.
    #[must_use]
    pub fn label_at(&self, index: usize) -> Option<&str> {
        self.labels.get_by_right(&index).map(String::as_str)
    }

    /// The label table mapping names to instruction indices.
    #[must_use]
    pub fn labels(&self) -> &BiMap<String, usize> {
        &self.labels
    }

    /// The declared language version, defaulting to 1 when the source has no
    /// `#pragma version` directive.
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// The detected execution mode.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Renders the canonical form of the program: the pragma directive,
    /// labels, and one instruction per line.
    ///
    /// Parsing the rendered text yields an equivalent instruction stream.
    #[must_use]
    pub fn canonical_text(&self) -> String {
        let mut out = format!("#pragma version {}\n", self.version);
        for (index, instruction) in self.instructions.iter().enumerate() {
            if let Some(label) = self.label_at(index) {
                out.push_str(label);
                out.push_str(":\n");
            }
            out.push_str(&instruction.to_string());
            out.push('\n');
        }
        out
    }
}
