//! Save files and snapshot formats for CrossCat states.
//!
//! A save directory holds `config.yaml`, a codebook, one `<id>.state`
//! snapshot per chain, and optionally `rng.yaml`. The data table is not saved;
//! snapshots are checked against a table supplied at load time (see
//! [`conformance`]).
#![warn(unused_extern_crates)]
#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone
)]

mod config;
pub mod conformance;
mod error;
pub mod snapshot;
mod utils;

use std::path::Path;

use crosscat_codebook::Codebook;
use log::info;
use rand_xoshiro::Xoshiro256Plus;

pub use config::{FileConfig, SerializedType};
pub use conformance::{validate_snapshot, ConformanceError};
pub use error::Error;
pub use snapshot::{LatentState, XD, XL};
pub use utils::{
    deserialize_file, get_state_ids, save_state, serialize_obj,
};

/// The current save-file version
pub const METADATA_VERSION: i32 = 1;

/// Everything needed to restore an engine, minus the data table
#[derive(Clone, Debug)]
pub struct Metadata {
    pub states: Vec<LatentState>,
    pub state_ids: Vec<usize>,
    pub codebook: Codebook,
    pub rng: Option<Xoshiro256Plus>,
}

pub fn save_metadata<P: AsRef<Path>>(
    metadata: &Metadata,
    path: P,
    ser_type: SerializedType,
) -> Result<(), Error> {
    let path = path.as_ref();

    utils::path_validator(path)?;
    let file_config = FileConfig {
        metadata_version: METADATA_VERSION,
        serialized_type: ser_type,
    };
    utils::save_file_config(path, &file_config)?;

    info!("Saving codebook to {:?}...", path);
    utils::save_codebook(path, &metadata.codebook, &file_config)?;

    if let Some(ref rng) = metadata.rng {
        info!("Saving rng to {:?}...", path);
        utils::save_rng(path, rng)?;
    } else {
        info!("RNG is None. Skipping.");
    }

    info!("Saving states to {:?}...", path);
    utils::save_states(
        path,
        &metadata.states,
        &metadata.state_ids,
        &file_config,
    )
}

pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<Metadata, Error> {
    let path = path.as_ref();

    utils::path_validator(path)?;
    let file_config = utils::load_file_config(path)?;

    match file_config.metadata_version {
        METADATA_VERSION => {
            let (states, state_ids) = utils::load_states(path, &file_config)?;
            let codebook = utils::load_codebook(path, &file_config)?;
            let rng = utils::load_rng(path).ok();
            Ok(Metadata {
                states,
                state_ids,
                codebook,
                rng,
            })
        }
        requested => Err(Error::UnsupportedMetadataVersion {
            requested,
            max_supported: METADATA_VERSION,
        }),
    }
}
