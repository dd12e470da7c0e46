use tweenflow_image::ImageDtype;

use crate::{error::InterpolationError, storage::FrameStorage, template::PathTemplate};

/// Move of one original frame to its slot in the expanded timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameOp {
    /// Original index.
    pub from: usize,
    /// Index in the expanded timeline, `from * factor`.
    pub to: usize,
}

/// Plan the renames that spread `count` originals starting at `first` by `factor`.
///
/// The moves are ordered from the highest original index to the lowest, so a
/// target is never an original that still has to move. Frames already in
/// place (index 0) are left out.
///
/// # Errors
///
/// Returns [`InterpolationError::InvalidFactor`] if `factor < 2` or an index overflows.
///
/// # Examples
///
/// ```
/// use tweenflow::renumber::{plan_renumbering, RenameOp};
///
/// let plan = plan_renumbering(0, 3, 2).unwrap();
///
/// assert_eq!(plan, vec![RenameOp { from: 2, to: 4 }, RenameOp { from: 1, to: 2 }]);
/// ```
pub fn plan_renumbering(
    first: usize,
    count: usize,
    factor: usize,
) -> Result<Vec<RenameOp>, InterpolationError> {
    if factor < 2 {
        return Err(InterpolationError::InvalidFactor { factor, gap: 0 });
    }

    let last = first
        .checked_add(count)
        .ok_or(InterpolationError::InvalidFactor { factor, gap: 0 })?;

    (first..last)
        .rev()
        .filter(|&from| from != 0)
        .map(|from| {
            from.checked_mul(factor)
                .map(|to| RenameOp { from, to })
                .ok_or(InterpolationError::InvalidFactor { factor, gap: 0 })
        })
        .collect()
}

/// Renumber a stored sequence so that original frame `i` ends up at `i * factor`.
///
/// The whole plan is validated before the first rename: every source must
/// exist and every occupied target must be an original that moves earlier in
/// the plan. Each rename re-checks both ends right before it happens.
///
/// # Errors
///
/// * [`InterpolationError::MissingFrame`] if an original frame is absent.
/// * [`InterpolationError::RenameCollision`] if a target holds an unrelated frame.
/// * [`InterpolationError::InvalidFactor`] if `factor < 2`.
///
/// # Returns
///
/// The executed renames, in execution order.
pub fn renumber_sequence<T, const C: usize, S>(
    storage: &S,
    template: &PathTemplate,
    first: usize,
    count: usize,
    factor: usize,
) -> Result<Vec<RenameOp>, InterpolationError>
where
    T: ImageDtype,
    S: FrameStorage<T, C> + ?Sized,
{
    let plan = plan_renumbering(first, count, factor)?;
    let originals = first..first + count;

    for op in &plan {
        let from = template.path_for(op.from);
        if !storage.exists(&from) {
            return Err(InterpolationError::MissingFrame {
                index: op.from,
                path: from,
            });
        }

        let to = template.path_for(op.to);
        if storage.exists(&to) && !originals.contains(&op.to) {
            return Err(InterpolationError::RenameCollision { from, to });
        }
    }

    for op in &plan {
        let (from, to) = (template.path_for(op.from), template.path_for(op.to));
        if !storage.exists(&from) {
            return Err(InterpolationError::MissingFrame {
                index: op.from,
                path: from,
            });
        }
        if storage.exists(&to) {
            return Err(InterpolationError::RenameCollision { from, to });
        }

        log::info!("renaming {} to {}", from.display(), to.display());
        storage.rename(&from, &to)?;
    }

    Ok(plan)
}
