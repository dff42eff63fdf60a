// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transient print files handed to local print commands.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;

use spoolwerk_core::error::DispatchError;

/// A temporary file holding one job's payload.
pub(crate) struct TransientArtifact {
    file: NamedTempFile,
}

impl TransientArtifact {
    /// Write `bytes` to a fresh uniquely named file with the given suffix.
    pub(crate) fn write(bytes: &[u8], suffix: &str) -> Result<Self, DispatchError> {
        let mut file = tempfile::Builder::new()
            .prefix("spoolwerk-")
            .suffix(suffix)
            .tempfile()
            .map_err(DispatchError::Artifact)?;
        file.write_all(bytes).map_err(DispatchError::Artifact)?;
        file.flush().map_err(DispatchError::Artifact)?;
        Ok(Self { file })
    }

    pub(crate) fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the file.  Failure is logged and otherwise ignored; it must
    /// not change the outcome of the print that used it.
    pub(crate) fn discard(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!(path = %path.display(), error = %e, "could not remove transient print file");
        }
    }
}

/// File suffix for a binary document, sniffed from its leading bytes.
pub(crate) fn document_suffix(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"%PDF") {
        ".pdf"
    } else if bytes.starts_with(b"%!PS") {
        ".ps"
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        ".png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        ".jpg"
    } else {
        ".bin"
    }
}
