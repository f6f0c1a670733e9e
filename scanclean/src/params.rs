//! Command parameters
//!
//! Hosts describe a command with a flat map of camelCase keys whose values
//! are numbers, booleans or strings. [`CommandParams::from_map`] turns such
//! a map into the typed options of one command, once, at the boundary:
//!
//! - unknown keys are ignored
//! - a value of the wrong type, or a number outside its domain, is
//!   [`ProcessError::InvalidInput`]
//! - an enumerated string without a handler is
//!   [`ProcessError::UnsupportedConfiguration`]
//!
//! # Keys
//!
//! | command          | keys |
//! |------------------|------|
//! | Deskew           | `deskewAlgorithm`, `minLengthFraction`, `maxLineGap`, `cannyLow`, `cannyHigh`, `minAreaFraction`, `closeSize`, `projectionRange`, `coarseStep`, `fineStep`, `keepCanvas`, `interpolation` |
//! | Binarize         | `method`, `preMethod`, `threshold`, `blockSize`, `adaptiveC`, `adaptiveMethod`, `openSize`, `windowSize`, `k`, `r`, `margin`, `useClahe`, `handwritingCleanup`, `retinexSigma`, `gammaHigh`, `gammaLow`, `normalization`, `percentileLow`, `percentileHigh` |
//! | BorderRemove     | `borderRemovalAlgorithm`, `darkThreshold`, `minAreaFraction`, `solidityThreshold`, `minSpanFraction`, `minDepthFraction`, `featherPx`, `repairMode`, `marginPx`, `marginLeft`, `marginTop`, `marginRight`, `marginBottom` |
//! | Despeckle        | `kernel`, `smallAreaMultiplier`, `smallAreaPx`, `maxSpeckHeightFraction`, `minReferenceHeight`, `debugVisualize`, `retainPunctuation`, `inkThreshold` |
//! | PunchHoleRemove  | `punchShape`, `diameterPx`, `widthPx`, `heightPx`, `sizeToleranceFraction`, `density`, `edgeBandPx`, `contrastMargin`, `minFillRatio`, `featherSigma` |
//! | SplitPages       | `analysisMaxWidth`, `useClahe`, `bandStart`, `bandEnd`, `minDeltaL`, `maxStdRatio`, `projectionWeight`, `minConfidence`, `throwIfLowConfidence`, `padPx`, `debug` |

use crate::{Command, ProcessError, ProcessResult};
use scanclean_color::{
    AdaptiveMethod, BinarizeMethod, BinarizeParameters, PreBinarizeParameters, PreBinarization,
};
use scanclean_doc::{
    BorderOptions, BorderRemovalAlgorithm, BorderRepair, DespeckleKernel, DespeckleSettings,
    EdgeBands, HoleDensity, ManualMargins, PunchOptions, PunchSpec, RetentionHeuristics,
    SmallAreaCutoff, SplitOptions,
};
use scanclean_filter::{ClaheOptions, RetinexNormalization};
use scanclean_recog::{DeskewOptions, SkewMethod};
use scanclean_transform::RotateMethod;
use std::collections::BTreeMap;
use std::str::FromStr;

// ============================================================================
// Untyped map
// ============================================================================

/// A parameter value as sent by the host
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Number(_) => "number",
            ParamValue::Bool(_) => "boolean",
            ParamValue::Text(_) => "string",
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Number(v as f64)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Number(v as f64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// String-keyed parameters for one command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap {
    values: BTreeMap<String, ParamValue>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ParamMap::insert`].
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn type_error(key: &str, expected: &str, found: &ParamValue) -> ProcessError {
        ProcessError::InvalidInput(format!(
            "parameter '{key}' must be a {expected}, got {} {found:?}",
            found.type_name()
        ))
    }

    /// Finite number; numeric strings are accepted.
    pub fn number(&self, key: &str) -> ProcessResult<Option<f64>> {
        let v = match self.get(key) {
            None => return Ok(None),
            Some(ParamValue::Number(v)) => *v,
            Some(found @ ParamValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| Self::type_error(key, "number", found))?,
            Some(found) => return Err(Self::type_error(key, "number", found)),
        };
        if !v.is_finite() {
            return Err(ProcessError::InvalidInput(format!("parameter '{key}' is not finite")));
        }
        Ok(Some(v))
    }

    /// Boolean; "true" / "false" strings are accepted.
    pub fn flag(&self, key: &str) -> ProcessResult<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Bool(b)) => Ok(Some(*b)),
            Some(found @ ParamValue::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(Self::type_error(key, "boolean", found)),
            },
            Some(found) => Err(Self::type_error(key, "boolean", found)),
        }
    }

    pub fn text(&self, key: &str) -> ProcessResult<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Text(s)) => Ok(Some(s.as_str())),
            Some(found) => Err(Self::type_error(key, "string", found)),
        }
    }

    /// Non-negative integer no larger than `max`.
    fn integer(&self, key: &str, max: u32) -> ProcessResult<Option<u32>> {
        let Some(v) = self.number(key)? else {
            return Ok(None);
        };
        if v < 0.0 || v.fract() != 0.0 || v > max as f64 {
            return Err(ProcessError::InvalidInput(format!(
                "parameter '{key}' must be an integer in [0, {max}], got {v}"
            )));
        }
        Ok(Some(v as u32))
    }

    fn unsigned(&self, key: &str) -> ProcessResult<Option<u32>> {
        self.integer(key, u32::MAX)
    }

    fn byte(&self, key: &str) -> ProcessResult<Option<u8>> {
        Ok(self.integer(key, 255)?.map(|v| v as u8))
    }

    fn choice<T>(&self, key: &str) -> ProcessResult<Option<T>>
    where
        T: FromStr,
        ProcessError: From<T::Err>,
    {
        match self.text(key)? {
            None => Ok(None),
            Some(s) => Ok(Some(s.parse::<T>()?)),
        }
    }

    fn choice_with<T>(&self, key: &str, parse: fn(&str) -> Option<T>) -> ProcessResult<Option<T>> {
        match self.text(key)? {
            None => Ok(None),
            Some(s) => parse(s.trim())
                .map(Some)
                .ok_or_else(|| ProcessError::UnsupportedConfiguration(format!("{key} '{s}'"))),
        }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ParamMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

fn parse_rotate_method(s: &str) -> Option<RotateMethod> {
    match s.to_ascii_lowercase().as_str() {
        "bilinear" | "linear" => Some(RotateMethod::Bilinear),
        "nearest" | "sampling" => Some(RotateMethod::Sampling),
        _ => None,
    }
}

fn parse_adaptive_method(s: &str) -> Option<AdaptiveMethod> {
    match s.to_ascii_lowercase().as_str() {
        "mean" => Some(AdaptiveMethod::Mean),
        "gaussian" => Some(AdaptiveMethod::Gaussian),
        _ => None,
    }
}

fn parse_repair(s: &str) -> Option<BorderRepair> {
    match s.to_ascii_lowercase().as_str() {
        "crop" => Some(BorderRepair::Crop),
        "fill" => Some(BorderRepair::Fill),
        _ => None,
    }
}

fn parse_kernel(s: &str) -> Option<DespeckleKernel> {
    match s.to_ascii_lowercase().as_str() {
        "none" | "" => Some(DespeckleKernel::None),
        "1x3" | "horizontal" => Some(DespeckleKernel::Horizontal1x3),
        "3x1" | "vertical" => Some(DespeckleKernel::Vertical3x1),
        "3x3" | "square" => Some(DespeckleKernel::Square3x3),
        _ => None,
    }
}

#[derive(Clone, Copy)]
enum ShapeKind {
    Circle,
    Rect,
}

fn parse_shape(s: &str) -> Option<ShapeKind> {
    match s.to_ascii_lowercase().as_str() {
        "circle" | "round" => Some(ShapeKind::Circle),
        "rect" | "rectangle" | "slot" => Some(ShapeKind::Rect),
        _ => None,
    }
}

// ============================================================================
// Typed parameters
// ============================================================================

/// Binarizer selection and tunables
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BinarizeCommand {
    pub method: BinarizeMethod,
    pub params: BinarizeParameters,
    pub pre: PreBinarizeParameters,
}

/// Options of one command, validated
#[derive(Debug, Clone, PartialEq)]
pub enum CommandParams {
    Deskew(DeskewOptions),
    Binarize(BinarizeCommand),
    BorderRemove(BorderOptions),
    Despeckle(DespeckleSettings),
    PunchHoleRemove(PunchOptions),
    SplitPages(SplitOptions),
}

impl CommandParams {
    pub fn command(&self) -> Command {
        match self {
            CommandParams::Deskew(_) => Command::Deskew,
            CommandParams::Binarize(_) => Command::Binarize,
            CommandParams::BorderRemove(_) => Command::BorderRemove,
            CommandParams::Despeckle(_) => Command::Despeckle,
            CommandParams::PunchHoleRemove(_) => Command::PunchHoleRemove,
            CommandParams::SplitPages(_) => Command::SplitPages,
        }
    }

    /// Default options of `command`.
    ///
    /// Punch-hole removal has no default hole size, so its defaults look
    /// for nothing.
    pub fn defaults(command: Command) -> Self {
        match command {
            Command::Deskew => CommandParams::Deskew(DeskewOptions::default()),
            Command::Binarize => CommandParams::Binarize(BinarizeCommand::default()),
            Command::BorderRemove => CommandParams::BorderRemove(BorderOptions::default()),
            Command::Despeckle => CommandParams::Despeckle(DespeckleSettings::default()),
            Command::PunchHoleRemove => CommandParams::PunchHoleRemove(PunchOptions::default()),
            Command::SplitPages => CommandParams::SplitPages(SplitOptions::default()),
        }
    }

    /// Check every value against its domain.
    pub fn validate(&self) -> ProcessResult<()> {
        match self {
            CommandParams::Deskew(o) => o.skew.validate()?,
            CommandParams::Binarize(b) => {
                b.params.validate(b.method)?;
                if b.pre.method == PreBinarization::HomomorphicRetinex {
                    b.pre.retinex.validate()?;
                }
            }
            CommandParams::BorderRemove(o) => o.validate()?,
            CommandParams::Despeckle(s) => s.validate()?,
            CommandParams::PunchHoleRemove(o) => o.validate()?,
            CommandParams::SplitPages(o) => o.validate()?,
        }
        Ok(())
    }

    /// Parse the parameters of `command` from `map`.
    ///
    /// # Errors
    ///
    /// [`ProcessError::InvalidInput`] for mistyped or out-of-range values,
    /// [`ProcessError::UnsupportedConfiguration`] for unknown enumerated
    /// strings.
    pub fn from_map(command: Command, map: &ParamMap) -> ProcessResult<Self> {
        let params = match command {
            Command::Deskew => CommandParams::Deskew(deskew_from_map(map)?),
            Command::Binarize => CommandParams::Binarize(binarize_from_map(map)?),
            Command::BorderRemove => CommandParams::BorderRemove(border_from_map(map)?),
            Command::Despeckle => CommandParams::Despeckle(despeckle_from_map(map)?),
            Command::PunchHoleRemove => CommandParams::PunchHoleRemove(punch_from_map(map)?),
            Command::SplitPages => CommandParams::SplitPages(split_from_map(map)?),
        };
        params.validate()?;
        Ok(params)
    }
}

fn deskew_from_map(map: &ParamMap) -> ProcessResult<DeskewOptions> {
    let mut o = DeskewOptions::default();
    if let Some(m) = map.choice::<SkewMethod>("deskewAlgorithm")? {
        o.method = m;
    }
    if let Some(v) = map.number("minLengthFraction")? {
        o.skew.hough.min_length_fraction = v;
    }
    if let Some(v) = map.number("maxLineGap")? {
        o.skew.hough.max_line_gap = v;
    }
    if let Some(v) = map.number("cannyLow")? {
        o.skew.hough.canny_low = v as f32;
    }
    if let Some(v) = map.number("cannyHigh")? {
        o.skew.hough.canny_high = v as f32;
    }
    if let Some(v) = map.number("minAreaFraction")? {
        o.skew.border.min_area_fraction = v;
    }
    if let Some(v) = map.unsigned("closeSize")? {
        o.skew.border.close_size = v;
    }
    if let Some(v) = map.number("projectionRange")? {
        o.skew.projection.range = v;
    }
    if let Some(v) = map.number("coarseStep")? {
        o.skew.projection.coarse_step = v;
    }
    if let Some(v) = map.number("fineStep")? {
        o.skew.projection.fine_step = v;
    }
    if let Some(v) = map.flag("keepCanvas")? {
        o.keep_canvas = v;
    }
    if let Some(m) = map.choice_with("interpolation", parse_rotate_method)? {
        o.rotate_method = m;
    }
    Ok(o)
}

fn binarize_from_map(map: &ParamMap) -> ProcessResult<BinarizeCommand> {
    let mut b = BinarizeCommand::default();
    if let Some(m) = map.choice::<BinarizeMethod>("method")? {
        b.method = m;
    }
    if let Some(m) = map.choice::<PreBinarization>("preMethod")? {
        b.pre.method = m;
    }
    if let Some(v) = map.byte("threshold")? {
        b.params.threshold = v;
    }

    let adaptive = &mut b.params.adaptive;
    if let Some(v) = map.unsigned("blockSize")? {
        adaptive.block_size = Some(v);
    }
    if let Some(v) = map.number("adaptiveC")? {
        adaptive.c = v as f32;
    }
    if let Some(m) = map.choice_with("adaptiveMethod", parse_adaptive_method)? {
        adaptive.method = m;
    }
    if let Some(v) = map.unsigned("openSize")? {
        adaptive.open_size = v;
    }

    let sauvola = &mut b.params.sauvola;
    if let Some(v) = map.unsigned("windowSize")? {
        sauvola.window = v;
    }
    if let Some(v) = map.number("k")? {
        sauvola.k = v as f32;
    }
    if let Some(v) = map.number("r")? {
        sauvola.r = v as f32;
    }
    if let Some(v) = map.number("margin")? {
        sauvola.margin = v as f32;
    }
    if let Some(on) = map.flag("useClahe")? {
        sauvola.contrast = on.then(ClaheOptions::default);
    }
    if let Some(v) = map.flag("handwritingCleanup")? {
        sauvola.cleanup = v;
    }

    let retinex = &mut b.pre.retinex;
    if let Some(v) = map.number("retinexSigma")? {
        retinex.sigma = v as f32;
    }
    if let Some(v) = map.number("gammaHigh")? {
        retinex.gamma_high = v as f32;
    }
    if let Some(v) = map.number("gammaLow")? {
        retinex.gamma_low = v as f32;
    }
    let low = map.number("percentileLow")?;
    let high = map.number("percentileHigh")?;
    match map.text("normalization")?.map(|s| s.trim().to_ascii_lowercase()) {
        Some(s) if s == "minmax" => retinex.normalization = RetinexNormalization::MinMax,
        Some(s) if s != "percentile" => {
            return Err(ProcessError::UnsupportedConfiguration(format!("normalization '{s}'")));
        }
        _ => {
            if low.is_some() || high.is_some() {
                retinex.normalization = RetinexNormalization::Percentile {
                    low: low.unwrap_or(0.5),
                    high: high.unwrap_or(99.5),
                };
            }
        }
    }
    Ok(b)
}

fn border_from_map(map: &ParamMap) -> ProcessResult<BorderOptions> {
    let mut o = BorderOptions::default();
    if let Some(a) = map.choice::<BorderRemovalAlgorithm>("borderRemovalAlgorithm")? {
        o.algorithm = a;
    }
    if let Some(v) = map.byte("darkThreshold")? {
        o.dark_threshold = v;
    }
    if let Some(v) = map.number("minAreaFraction")? {
        o.min_area_fraction = v;
    }
    if let Some(v) = map.number("solidityThreshold")? {
        o.solidity_threshold = v;
    }
    if let Some(v) = map.number("minSpanFraction")? {
        o.min_span_fraction = v;
    }
    if let Some(v) = map.number("minDepthFraction")? {
        o.min_depth_fraction = v;
    }
    if let Some(v) = map.unsigned("featherPx")? {
        o.feather_px = v;
    }
    if let Some(r) = map.choice_with("repairMode", parse_repair)? {
        o.repair = r;
    }
    let base = map.unsigned("marginPx")?.unwrap_or(0);
    o.margins = ManualMargins {
        left: map.unsigned("marginLeft")?.unwrap_or(base),
        top: map.unsigned("marginTop")?.unwrap_or(base),
        right: map.unsigned("marginRight")?.unwrap_or(base),
        bottom: map.unsigned("marginBottom")?.unwrap_or(base),
    };
    Ok(o)
}

fn despeckle_from_map(map: &ParamMap) -> ProcessResult<DespeckleSettings> {
    let mut s = DespeckleSettings::default();
    if let Some(k) = map.choice_with("kernel", parse_kernel)? {
        s.kernel = k;
    }
    if let Some(v) = map.number("smallAreaMultiplier")? {
        s.cutoff = SmallAreaCutoff::Relative { multiplier: v };
    }
    if let Some(v) = map.unsigned("smallAreaPx")? {
        s.cutoff = SmallAreaCutoff::Absolute(v);
    }
    if let Some(v) = map.number("maxSpeckHeightFraction")? {
        s.max_speck_height_fraction = v;
    }
    if let Some(v) = map.unsigned("minReferenceHeight")? {
        s.min_reference_height = v;
    }
    if let Some(v) = map.flag("debugVisualize")? {
        s.debug_visualize = v;
    }
    if let Some(true) = map.flag("retainPunctuation")? {
        s.retention = RetentionHeuristics::enabled();
    }
    if let Some(v) = map.byte("inkThreshold")? {
        s.ink_threshold = Some(v);
    }
    Ok(s)
}

fn punch_from_map(map: &ParamMap) -> ProcessResult<PunchOptions> {
    let shape = map
        .choice_with("punchShape", parse_shape)?
        .unwrap_or(ShapeKind::Circle);
    let required = |key: &str| -> ProcessResult<f64> {
        map.number(key)?
            .ok_or_else(|| ProcessError::InvalidInput(format!("parameter '{key}' is required")))
    };
    let mut spec = match shape {
        ShapeKind::Circle => PunchSpec::circle(required("diameterPx")?),
        ShapeKind::Rect => PunchSpec::rect(required("widthPx")?, required("heightPx")?),
    };
    if let Some(v) = map.number("sizeToleranceFraction")? {
        spec = spec.with_tolerance(v);
    }
    if let Some(d) = map.choice::<HoleDensity>("density")? {
        spec = spec.with_density(d);
    }

    let mut o = PunchOptions::new(vec![spec]);
    if let Some(px) = map.unsigned("edgeBandPx")? {
        o = o.with_bands(EdgeBands::uniform(px));
    }
    if let Some(v) = map.number("contrastMargin")? {
        o = o.with_contrast_margin(v);
    }
    if let Some(v) = map.number("minFillRatio")? {
        o.min_fill_ratio = v;
    }
    if let Some(v) = map.number("featherSigma")? {
        o = o.with_feather_sigma(v as f32);
    }
    Ok(o)
}

fn split_from_map(map: &ParamMap) -> ProcessResult<SplitOptions> {
    let mut o = SplitOptions::default();
    if let Some(v) = map.unsigned("analysisMaxWidth")? {
        o.analysis_max_width = v;
    }
    if let Some(on) = map.flag("useClahe")? {
        o.clahe = on.then(ClaheOptions::default);
    }
    if let Some(v) = map.number("bandStart")? {
        o.band_start = v;
    }
    if let Some(v) = map.number("bandEnd")? {
        o.band_end = v;
    }
    if let Some(v) = map.number("minDeltaL")? {
        o.min_delta_l = v;
    }
    if let Some(v) = map.number("maxStdRatio")? {
        o.max_std_ratio = v;
    }
    if let Some(v) = map.number("projectionWeight")? {
        o.projection_weight = v;
    }
    if let Some(v) = map.number("minConfidence")? {
        o.min_confidence = v;
    }
    if let Some(v) = map.flag("throwIfLowConfidence")? {
        o.throw_if_low_confidence = v;
    }
    if let Some(v) = map.unsigned("padPx")? {
        o.pad_px = v;
    }
    if let Some(v) = map.flag("debug")? {
        o.debug = v;
    }
    Ok(o)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanclean_core::ErrorKind;

    #[test]
    fn test_empty_map_gives_defaults() {
        let p = CommandParams::from_map(Command::Despeckle, &ParamMap::new()).unwrap();
        assert_eq!(p, CommandParams::defaults(Command::Despeckle));
        assert_eq!(p.command(), Command::Despeckle);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let map = ParamMap::new().with("noSuchKey", 3.0).with("threshold", 90);
        let CommandParams::Binarize(b) = CommandParams::from_map(Command::Binarize, &map).unwrap() else {
            panic!("wrong command");
        };
        assert_eq!(b.params.threshold, 90);
        assert_eq!(b.method, BinarizeMethod::Threshold);
    }

    #[test]
    fn test_min_length_fraction_domain() {
        for bad in [0.0, 1.5, -0.2] {
            let map = ParamMap::new().with("minLengthFraction", bad);
            let err = CommandParams::from_map(Command::Deskew, &map).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "value {bad}");
        }
        let map = ParamMap::new().with("minLengthFraction", 1.0);
        assert!(CommandParams::from_map(Command::Deskew, &map).is_ok());
    }

    #[test]
    fn test_unknown_enum_is_unsupported() {
        let cases = [
            (Command::Deskew, "deskewAlgorithm", "Radon"),
            (Command::Binarize, "method", "Niblack"),
            (Command::Binarize, "preMethod", "Gamma"),
            (Command::BorderRemove, "borderRemovalAlgorithm", "ByMagic"),
            (Command::Despeckle, "kernel", "5x5"),
        ];
        for (cmd, key, value) in cases {
            let map = ParamMap::new().with(key, value);
            let err = CommandParams::from_map(cmd, &map).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedConfiguration, "{key}={value}");
        }
    }

    #[test]
    fn test_type_mismatch_is_invalid() {
        let map = ParamMap::new().with("keepCanvas", 2.0);
        let err = CommandParams::from_map(Command::Deskew, &map).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let map = ParamMap::new().with("darkThreshold", 300);
        let err = CommandParams::from_map(Command::BorderRemove, &map).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_string_values_are_coerced() {
        let map = ParamMap::new()
            .with("minConfidence", "0.4")
            .with("throwIfLowConfidence", "true");
        let CommandParams::SplitPages(o) = CommandParams::from_map(Command::SplitPages, &map).unwrap() else {
            panic!("wrong command");
        };
        assert_eq!(o.min_confidence, 0.4);
        assert!(o.throw_if_low_confidence);
    }

    #[test]
    fn test_punch_spec_from_map() {
        let map = ParamMap::new()
            .with("punchShape", "Circle")
            .with("diameterPx", 30)
            .with("sizeToleranceFraction", 0.4)
            .with("density", "Dark");
        let CommandParams::PunchHoleRemove(o) = CommandParams::from_map(Command::PunchHoleRemove, &map).unwrap()
        else {
            panic!("wrong command");
        };
        assert_eq!(
            o.specs,
            vec![PunchSpec::circle(30.0).with_tolerance(0.4).with_density(HoleDensity::Dark)]
        );

        let missing = ParamMap::new().with("punchShape", "Rect").with("widthPx", 40);
        let err = CommandParams::from_map(Command::PunchHoleRemove, &missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_manual_margins() {
        let map = ParamMap::new()
            .with("borderRemovalAlgorithm", "Manual")
            .with("marginPx", 10)
            .with("marginLeft", 25);
        let CommandParams::BorderRemove(o) = CommandParams::from_map(Command::BorderRemove, &map).unwrap() else {
            panic!("wrong command");
        };
        assert_eq!(o.algorithm, BorderRemovalAlgorithm::Manual);
        assert_eq!(o.margins.left, 25);
        assert_eq!(o.margins.bottom, 10);
    }
}
