//! Ordered command lists
//!
//! A [`Pipeline`] is the per-file unit of a batch run: the same commands,
//! in the same order, applied to every page. Splitting produces two pages
//! and so may only appear last.

use crate::{
    Command, CommandOutput, CommandParams, ImageProcessor, NativeProcessor, ParamMap, ProcessError,
    ProcessResult,
};
use scanclean_core::{CancelToken, RasterBuffer};
use tracing::{debug, instrument};

/// Commands applied in order to one page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    steps: Vec<CommandParams>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn then(mut self, params: CommandParams) -> Self {
        self.steps.push(params);
        self
    }

    /// Append a step parsed from a parameter map.
    pub fn then_parsed(self, command: Command, map: &ParamMap) -> ProcessResult<Self> {
        Ok(self.then(CommandParams::from_map(command, map)?))
    }

    pub fn steps(&self) -> &[CommandParams] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check every step, and that a split is the last one.
    pub fn validate(&self) -> ProcessResult<()> {
        for (i, step) in self.steps.iter().enumerate() {
            step.validate()?;
            if step.command() == Command::SplitPages && i + 1 != self.steps.len() {
                return Err(ProcessError::InvalidInput(format!(
                    "SplitPages must be the last step, found at {} of {}",
                    i + 1,
                    self.steps.len()
                )));
            }
        }
        Ok(())
    }

    /// Run every step on `src` with a [`NativeProcessor`].
    pub fn run(&self, src: RasterBuffer, cancel: &CancelToken) -> ProcessResult<CommandOutput> {
        let mut processor = NativeProcessor::new();
        self.run_with(&mut processor, src, cancel)?;
        processor
            .take_output()
            .ok_or_else(|| ProcessError::InvalidInput("pipeline produced no output".into()))
    }

    /// Run every step on `src` through `processor`.
    ///
    /// The pipeline is validated before the first step runs. The first
    /// failing step ends the run; cancellation is checked between steps.
    #[instrument(skip_all, fields(steps = self.steps.len(), width = src.width(), height = src.height()))]
    pub fn run_with<P: ImageProcessor>(
        &self,
        processor: &mut P,
        src: RasterBuffer,
        cancel: &CancelToken,
    ) -> ProcessResult<()> {
        self.validate()?;
        processor.load(src)?;
        for (i, step) in self.steps.iter().enumerate() {
            cancel.check()?;
            let out = processor.apply_command(step, cancel)?;
            debug!(step = i, command = %step.command(), split = out.is_split(), "step done");
        }
        Ok(())
    }
}

impl FromIterator<CommandParams> for Pipeline {
    fn from_iter<I: IntoIterator<Item = CommandParams>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanclean_core::{ErrorKind, PixelLayout};

    #[test]
    fn test_split_must_be_last() {
        let p: Pipeline = [
            CommandParams::defaults(Command::SplitPages),
            CommandParams::defaults(Command::Binarize),
        ]
        .into_iter()
        .collect();
        assert_eq!(p.validate().unwrap_err().kind(), ErrorKind::InvalidInput);

        let p = Pipeline::new()
            .then(CommandParams::defaults(Command::Binarize))
            .then(CommandParams::defaults(Command::SplitPages));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_empty_pipeline_returns_input() {
        let page = RasterBuffer::new_filled(20, 10, PixelLayout::Gray, 180).unwrap();
        let out = Pipeline::new().run(page.clone(), &CancelToken::none()).unwrap();
        assert_eq!(out, CommandOutput::Page(page));
    }

    #[test]
    fn test_cancelled_before_first_step() {
        let page = RasterBuffer::new_filled(20, 10, PixelLayout::Gray, 180).unwrap();
        let p = Pipeline::new().then(CommandParams::defaults(Command::Binarize));
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(p.run(page, &cancel).unwrap_err().kind(), ErrorKind::Cancelled);
    }
}
