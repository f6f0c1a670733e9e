//! Command execution
//!
//! [`run_command`] applies one [`CommandParams`] to a page. The
//! [`ImageProcessor`] trait is the capability a host drives: load a page,
//! apply commands to it, read the output back. [`NativeProcessor`] is the
//! backend built on the scanclean crates.

use crate::params::BinarizeCommand;
use crate::{CommandParams, ProcessError, ProcessResult};
use scanclean_color::binarize;
use scanclean_core::{CancelToken, RasterBuffer};
use scanclean_doc::{
    BorderOptions, DespeckleSettings, PunchOptions, SplitOptions, despeckle, remove_borders,
    remove_punch_holes, split_pages,
};
use scanclean_recog::{DeskewOptions, deskew};
use tracing::{debug, instrument};

/// What a command left behind
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// One page
    Page(RasterBuffer),
    /// A spread split at its gutter
    Pages { left: RasterBuffer, right: RasterBuffer },
}

impl CommandOutput {
    /// The single page, if the output was not split.
    pub fn page(&self) -> Option<&RasterBuffer> {
        match self {
            CommandOutput::Page(p) => Some(p),
            CommandOutput::Pages { .. } => None,
        }
    }

    pub fn into_pages(self) -> Vec<RasterBuffer> {
        match self {
            CommandOutput::Page(p) => vec![p],
            CommandOutput::Pages { left, right } => vec![left, right],
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, CommandOutput::Pages { .. })
    }
}

#[instrument(skip_all, fields(method = %options.method, width = src.width(), height = src.height()))]
fn run_deskew(src: &RasterBuffer, options: &DeskewOptions, cancel: &CancelToken) -> ProcessResult<RasterBuffer> {
    let outcome = deskew(src, options, cancel)?;
    debug!(angle = ?outcome.angle, rotated = outcome.rotated, "deskew applied");
    Ok(outcome.image)
}

#[instrument(skip_all, fields(method = %cmd.method, pre = %cmd.pre.method))]
fn run_binarize(src: &RasterBuffer, cmd: &BinarizeCommand, cancel: &CancelToken) -> ProcessResult<RasterBuffer> {
    Ok(binarize(src, cmd.method, &cmd.params, &cmd.pre, cancel)?)
}

#[instrument(skip_all, fields(algorithm = %options.algorithm))]
fn run_border_remove(
    src: &RasterBuffer,
    options: &BorderOptions,
    cancel: &CancelToken,
) -> ProcessResult<RasterBuffer> {
    let outcome = remove_borders(src, options, cancel)?;
    debug!(
        removed = outcome.removed_components,
        crop = ?outcome.crop,
        "border removal applied"
    );
    Ok(outcome.image)
}

#[instrument(skip_all, fields(kernel = ?settings.kernel))]
fn run_despeckle(
    src: &RasterBuffer,
    settings: &DespeckleSettings,
    cancel: &CancelToken,
) -> ProcessResult<RasterBuffer> {
    let outcome = despeckle(src, settings, cancel)?;
    debug!(
        removed = outcome.removed_components,
        pixels = outcome.removed_pixels,
        "despeckle applied"
    );
    Ok(outcome.image)
}

#[instrument(skip_all, fields(specs = options.specs.len()))]
fn run_punch_remove(src: &RasterBuffer, options: &PunchOptions, cancel: &CancelToken) -> ProcessResult<RasterBuffer> {
    Ok(remove_punch_holes(src, options, cancel)?.image)
}

#[instrument(skip_all, fields(min_confidence = options.min_confidence))]
fn run_split(src: &RasterBuffer, options: &SplitOptions, cancel: &CancelToken) -> ProcessResult<CommandOutput> {
    let result = split_pages(src, options, cancel)?;
    match (result.success, result.left, result.right) {
        (true, Some(left), Some(right)) => Ok(CommandOutput::Pages { left, right }),
        _ => Ok(CommandOutput::Page(src.clone())),
    }
}

/// Apply one command to `src`.
///
/// The parameters are validated again here, so hand-built
/// [`CommandParams`] get the same checks as parsed ones. A split that is
/// refused leaves the page unchanged.
pub fn run_command(src: &RasterBuffer, params: &CommandParams, cancel: &CancelToken) -> ProcessResult<CommandOutput> {
    params.validate()?;
    if src.is_empty() {
        return Err(ProcessError::InvalidInput(format!("{}: empty input", params.command())));
    }
    let page = match params {
        CommandParams::Deskew(o) => run_deskew(src, o, cancel)?,
        CommandParams::Binarize(b) => run_binarize(src, b, cancel)?,
        CommandParams::BorderRemove(o) => run_border_remove(src, o, cancel)?,
        CommandParams::Despeckle(s) => run_despeckle(src, s, cancel)?,
        CommandParams::PunchHoleRemove(o) => run_punch_remove(src, o, cancel)?,
        CommandParams::SplitPages(o) => return run_split(src, o, cancel),
    };
    Ok(CommandOutput::Page(page))
}

// ============================================================================
// Processor capability
// ============================================================================

/// A backend that holds the current page and applies commands to it
pub trait ImageProcessor {
    /// Make `image` the current page, discarding any previous output.
    fn load(&mut self, image: RasterBuffer) -> ProcessResult<()>;

    /// Apply `params` to the current page.
    ///
    /// # Errors
    ///
    /// [`ProcessError::InvalidInput`] when nothing is loaded or the page
    /// was already split; otherwise whatever the command reports.
    fn apply_command(&mut self, params: &CommandParams, cancel: &CancelToken) -> ProcessResult<&CommandOutput>;

    /// Current output, if a page is loaded.
    fn output(&self) -> Option<&CommandOutput>;
}

/// [`ImageProcessor`] running the commands in-process
#[derive(Debug, Default)]
pub struct NativeProcessor {
    current: Option<CommandOutput>,
}

impl NativeProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the output, leaving the processor empty.
    pub fn take_output(&mut self) -> Option<CommandOutput> {
        self.current.take()
    }
}

impl ImageProcessor for NativeProcessor {
    fn load(&mut self, image: RasterBuffer) -> ProcessResult<()> {
        if image.is_empty() {
            return Err(ProcessError::InvalidInput("cannot load an empty image".into()));
        }
        self.current = Some(CommandOutput::Page(image));
        Ok(())
    }

    #[instrument(skip_all, fields(command = %params.command()))]
    fn apply_command(&mut self, params: &CommandParams, cancel: &CancelToken) -> ProcessResult<&CommandOutput> {
        let page = match &self.current {
            None => return Err(ProcessError::InvalidInput("no image loaded".into())),
            Some(CommandOutput::Pages { .. }) => {
                return Err(ProcessError::InvalidInput(format!(
                    "{}: page was already split",
                    params.command()
                )));
            }
            Some(CommandOutput::Page(p)) => p,
        };
        // a failed command keeps the previous page
        let out = run_command(page, params, cancel)?;
        Ok(&*self.current.insert(out))
    }

    fn output(&self) -> Option<&CommandOutput> {
        self.current.as_ref()
    }
}
