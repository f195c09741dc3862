/*
 * SPDX-FileCopyrightText: 2026 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Dangling-mass redistribution stage.

use crate::math::{LOG_ZERO, log_sum};
use crate::records::NodeRecord;
use crate::sources::SourceSet;

/// Applies the teleport correction to one record, in place.
///
/// For every slot *i* of the mass vector:
///
/// - if this node is the slot-*i* source, the new mass is
///   ln α ⊕ (ln(1 − α) + (mᵢ ⊕ ln missing)), where ⊕ is [`log_sum`]: the
///   source receives the full teleport jump plus the recovered missing mass,
///   on top of its link-propagated mass, with the non-jump component scaled
///   by 1 − α;
/// - otherwise the new mass is ln(1 − α) + mᵢ: ordinary nodes (and sources
///   of the *other* slots) get neither jump nor correction, since the
///   personalized teleport always returns to the slot's own source.
///
/// `missing_mass` may be exactly 0, in which case its log is [`LOG_ZERO`] and
/// the correction term vanishes. The adjacency is left untouched, and no
/// shuffle is needed: this is a pure per-record transform.
pub fn redistribute(record: &mut NodeRecord, sources: &SourceSet, alpha: f64, missing_mass: f64) {
    let log_jump = alpha.ln();
    let log_keep = (1.0 - alpha).ln();
    let log_missing = missing_mass.ln();
    let slot_of_node = sources.slot(record.node);

    for (slot, mass) in record.mass.iter_mut().enumerate() {
        let (jump, link) = if slot_of_node == Some(slot) {
            (log_jump, log_keep + log_sum(*mass, log_missing))
        } else {
            (LOG_ZERO, log_keep + *mass)
        };
        *mass = log_sum(jump, link);
    }
}
