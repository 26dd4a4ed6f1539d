use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use anyhow::Result;

use crate::error::MarkingError;
use crate::questions::QuestionPaper;

enum LoadMessage {
    Sheet(Result<Vec<u8>, MarkingError>),
    Paper(Result<QuestionPaper, MarkingError>),
}

/// Both halves of a marking job, fetched but not yet decoded into pages.
#[derive(Debug)]
pub struct LoadedSheet {
    pub sheet_bytes: Vec<u8>,
    pub paper: QuestionPaper,
}

/// Fetches the answer sheet and its question paper on two background threads.
///
/// The PDF is only read here; MuPDF opens it on the main thread once it arrives.
pub struct SheetLoader {
    rx: mpsc::Receiver<LoadMessage>,
    sheet: Option<Vec<u8>>,
    paper: Option<QuestionPaper>,
    finished: bool,
}

impl SheetLoader {
    pub fn spawn(sheet_path: PathBuf, paper_path: PathBuf) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<LoadMessage>();

        let sheet_tx = tx.clone();
        thread::Builder::new()
            .name("sheet-loader".into())
            .spawn(move || {
                log::info!("Loading answer sheet: {}", sheet_path.display());
                let result = std::fs::read(&sheet_path).map_err(|e| {
                    MarkingError::DocumentLoadFailure(format!("{}: {}", sheet_path.display(), e))
                });
                // Receiver gone means the window closed before the load finished.
                let _ = sheet_tx.send(LoadMessage::Sheet(result));
            })?;

        thread::Builder::new()
            .name("paper-loader".into())
            .spawn(move || {
                log::info!("Loading question paper: {}", paper_path.display());
                let result = std::fs::read(&paper_path)
                    .map_err(|e| {
                        MarkingError::QuestionPaperLoadFailure(format!(
                            "{}: {}",
                            paper_path.display(),
                            e
                        ))
                    })
                    .and_then(|bytes| QuestionPaper::from_slice(&bytes));
                let _ = tx.send(LoadMessage::Paper(result));
            })?;

        Ok(Self {
            rx,
            sheet: None,
            paper: None,
            finished: false,
        })
    }

    /// Non-blocking. Returns `Some` exactly once: when both resources have
    /// arrived, or as soon as either fails.
    pub fn poll(&mut self) -> Option<Result<LoadedSheet, MarkingError>> {
        if self.finished {
            return None;
        }
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    if let Err(e) = self.accept(message) {
                        self.finished = true;
                        return Some(Err(e));
                    }
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    if self.sheet.is_none() || self.paper.is_none() {
                        self.finished = true;
                        return Some(Err(MarkingError::DocumentLoadFailure(
                            "loader stopped before finishing".into(),
                        )));
                    }
                    break;
                }
            }
        }
        self.take_if_complete()
    }

    /// Block until both resources arrive or one fails.
    pub fn wait(mut self) -> Result<LoadedSheet, MarkingError> {
        while !self.finished {
            let message = self.rx.recv().map_err(|_| {
                MarkingError::DocumentLoadFailure("loader stopped before finishing".into())
            })?;
            self.accept(message)?;
            if let Some(loaded) = self.take_if_complete() {
                return loaded;
            }
        }
        Err(MarkingError::DocumentLoadFailure(
            "load already consumed".into(),
        ))
    }

    fn accept(&mut self, message: LoadMessage) -> Result<(), MarkingError> {
        match message {
            LoadMessage::Sheet(result) => {
                let bytes = result?;
                log::info!("Answer sheet fetched ({} bytes)", bytes.len());
                self.sheet = Some(bytes);
            }
            LoadMessage::Paper(result) => {
                let paper = result?;
                log::info!("Question paper fetched ({} top-level questions)", paper.questions.len());
                self.paper = Some(paper);
            }
        }
        Ok(())
    }

    fn take_if_complete(&mut self) -> Option<Result<LoadedSheet, MarkingError>> {
        if self.sheet.is_none() || self.paper.is_none() {
            return None;
        }
        self.finished = true;
        let sheet_bytes = self.sheet.take()?;
        let paper = self.paper.take()?;
        Some(Ok(LoadedSheet { sheet_bytes, paper }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sheetmark-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_loads_both_resources() {
        let dir = scratch_dir("ok");
        let sheet = dir.join("sheet.pdf");
        let paper = dir.join("paper.json");
        std::fs::write(&sheet, b"%PDF-1.4 stub").unwrap();
        std::fs::write(&paper, r#"{"questions":[{"questionNo":"1","marks":2}]}"#).unwrap();

        let loaded = SheetLoader::spawn(sheet, paper).unwrap().wait().unwrap();
        assert_eq!(loaded.sheet_bytes, b"%PDF-1.4 stub");
        assert_eq!(loaded.paper.leaves().len(), 1);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_sheet_is_a_document_failure() {
        let dir = scratch_dir("missing");
        let paper = dir.join("paper.json");
        std::fs::write(&paper, r#"{"questions":[{"questionNo":"1","marks":2}]}"#).unwrap();

        let result = SheetLoader::spawn(dir.join("nope.pdf"), paper).unwrap().wait();
        assert_matches!(result, Err(MarkingError::DocumentLoadFailure(_)));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_bad_paper_is_a_paper_failure() {
        let dir = scratch_dir("badpaper");
        let sheet = dir.join("sheet.pdf");
        let paper = dir.join("paper.json");
        std::fs::write(&sheet, b"%PDF").unwrap();
        std::fs::write(&paper, b"{ nope").unwrap();

        let mut loader = SheetLoader::spawn(sheet, paper).unwrap();
        let result = loop {
            if let Some(result) = loader.poll() {
                break result;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        };
        assert_matches!(result, Err(MarkingError::QuestionPaperLoadFailure(_)));
        assert!(loader.poll().is_none());
        std::fs::remove_dir_all(dir).ok();
    }
}
