use super::{FlatImage, GotSection, Overlap, Segment, WritePlan, compose_stub};
use crate::errors::ConvertError;
use crate::utils;

/// What to do about writes that change bytes an earlier write put down.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OverlapPolicy {
    /// Warn and let the later write win.
    #[default]
    Lenient,

    /// Fail the build.
    Strict,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuildOptions {
    pub overlap: OverlapPolicy,

    /// Largest image allowed, None for no limit.
    pub max_size: Option<u64>,
}

/// Works out the image size and the writes needed to fill it in.
pub fn plan<'a>(
    segments: &[Segment<'a>],
    got: Option<&GotSection<'a>>,
    entry: u64,
    template: &[u8],
) -> Result<WritePlan<'a>, ConvertError> {
    // The stub only has room for a 32-bit address.
    let entry = u32::try_from(entry).map_err(|_| {
        ConvertError::malformed(format!("entry point {entry:#x} doesn't fit in 32 bits"))
    })?;
    WritePlan::new(segments, got, compose_stub(template, entry))
}

/// Checks the plan against the options and then applies it.
pub fn render(plan: &WritePlan, options: &BuildOptions) -> Result<FlatImage, ConvertError> {
    if let Some(max) = options.max_size
        && plan.size > max
    {
        return Err(ConvertError::ImageTooLarge {
            size: plan.size,
            max,
        });
    }

    let conflicts: Vec<Overlap> = plan
        .overlaps()
        .into_iter()
        .filter(|o| o.conflicting && !o.expected())
        .collect();
    match options.overlap {
        OverlapPolicy::Lenient => {
            for overlap in conflicts.iter() {
                utils::warn(&format!("warning: {overlap}"));
            }
        }
        OverlapPolicy::Strict => {
            if let Some(overlap) = conflicts.first() {
                return Err(ConvertError::OverlappingWrites(overlap.to_string()));
            }
        }
    }

    plan.apply()
}
