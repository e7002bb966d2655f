// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job functions hosted by the worker.
//!
//! Every function is retry-safe, reads its inputs solely from the job
//! run's `job_params`, and is invoked through the dispatch decorator.

pub mod clingen;
pub mod clinvar;
pub mod gnomad;
pub mod mapping;
pub mod support;
pub mod uniprot;
pub mod variants;

use crate::registry::JobRegistry;

/// Register every job function under its stable name.
pub fn register_all(registry: &mut JobRegistry) {
    registry.register(
        "create_variants_for_score_set",
        variants::create_variants_for_score_set,
    );
    registry.register(
        "map_variants_for_score_set",
        mapping::map_variants_for_score_set,
    );
    registry.register(
        "submit_score_set_mappings_to_car",
        clingen::submit_score_set_mappings_to_car,
    );
    registry.register(
        "submit_score_set_mappings_to_ldh",
        clingen::submit_score_set_mappings_to_ldh,
    );
    registry.register("link_clingen_variants", clingen::link_clingen_variants);
    registry.register("link_gnomad_variants", gnomad::link_gnomad_variants);
    registry.register(
        "submit_uniprot_mapping_jobs_for_score_set",
        uniprot::submit_uniprot_mapping_jobs_for_score_set,
    );
    registry.register(
        "poll_uniprot_mapping_jobs_for_score_set",
        uniprot::poll_uniprot_mapping_jobs_for_score_set,
    );
    registry.register("refresh_clinvar_controls", clinvar::refresh_clinvar_controls);
}
