//! Misc file utilities
use std::fs;
use std::io;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crosscat_codebook::Codebook;

use crate::snapshot::LatentState;
use crate::{Error, FileConfig, SerializedType};

fn extenson_from_path<P: AsRef<Path>>(path: &P) -> Result<&str, Error> {
    path.as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Invalid file type",
            ))
        })
}

fn serialized_type_from_path<P: AsRef<Path>>(
    path: &P,
) -> Result<SerializedType, Error> {
    let ext = extenson_from_path(path)?;
    SerializedType::from_str(ext)
}

pub fn serialize_obj<T, P>(obj: &T, path: P) -> Result<(), Error>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let serialized_type = serialized_type_from_path(&path)?;

    save(obj, path, serialized_type)
}

pub fn deserialize_file<T, P>(path: P) -> Result<T, Error>
where
    for<'de> T: Deserialize<'de>,
    P: AsRef<Path>,
{
    let serialized_type = serialized_type_from_path(&path)?;

    load(path, serialized_type)
}

pub fn save<T, P>(
    obj: &T,
    path: P,
    serialized_type: SerializedType,
) -> Result<(), Error>
where
    T: Serialize,
    P: AsRef<Path>,
{
    match serialized_type {
        SerializedType::Yaml => serde_yaml::to_string(&obj)
            .map_err(Error::Yaml)
            .map(|s| s.into_bytes()),
        SerializedType::Json => {
            serde_json::to_vec_pretty(&obj).map_err(Error::Json)
        }
        SerializedType::Bincode => {
            bincode::serialize(&obj).map_err(Error::Bincode)
        }
    }
    .and_then(|bytes| {
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut writer = io::BufWriter::new(file);
        writer.write_all(&bytes).map_err(Error::Io)
    })
}

pub(crate) fn load<T, P>(
    path: P,
    serialized_type: SerializedType,
) -> Result<T, Error>
where
    for<'de> T: Deserialize<'de>,
    P: AsRef<Path>,
{
    let mut file = io::BufReader::new(fs::File::open(path)?);

    match serialized_type {
        SerializedType::Yaml => {
            let mut ser = String::new();
            file.read_to_string(&mut ser)?;
            serde_yaml::from_str(ser.as_str()).map_err(Error::Yaml)
        }
        SerializedType::Json => {
            let mut ser = String::new();
            file.read_to_string(&mut ser)?;
            serde_json::from_str(ser.as_str()).map_err(Error::Json)
        }
        SerializedType::Bincode => {
            bincode::deserialize_from(file).map_err(Error::Bincode)
        }
    }
}

pub fn path_validator<P: AsRef<Path>>(path: P) -> Result<(), Error> {
    if !path.as_ref().exists() {
        info!("{} does not exist. Creating...", path.as_ref().display());
        fs::create_dir(path).map_err(Error::Io)
    } else if !path.as_ref().is_dir() {
        let kind = io::ErrorKind::InvalidInput;
        Err(io::Error::new(kind, "path is not a directory").into())
    } else {
        Ok(())
    }
}

pub(crate) fn get_state_path<P: AsRef<Path>>(
    path: P,
    state_id: usize,
) -> PathBuf {
    let mut state_path = PathBuf::from(path.as_ref());
    state_path.push(state_id.to_string());
    state_path.set_extension("state");

    state_path
}

pub(crate) fn get_codebook_path<P: AsRef<Path>>(
    path: P,
    serialized_type: SerializedType,
) -> PathBuf {
    let mut cb_path = PathBuf::from(path.as_ref());
    cb_path.push("codebook");
    cb_path.set_extension(serialized_type.extension());

    cb_path
}

pub(crate) fn get_rng_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut rng_path = PathBuf::from(path.as_ref());
    rng_path.push("rng");
    rng_path.set_extension("yaml");

    rng_path
}

pub(crate) fn get_config_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut config_path = PathBuf::from(path.as_ref());
    config_path.push("config");
    config_path.set_extension("yaml");

    config_path
}

/// Returns the list IDs of the states saved in the directory `dir`. Will
/// return an empty vectory if the are no states.  Will return `Error` if `dir`
/// does not exist or is not a directory.
pub fn get_state_ids<P: AsRef<Path>>(path: P) -> Result<Vec<usize>, Error> {
    let paths = fs::read_dir(path)?;
    let mut state_ids: Vec<usize> = vec![];

    for path in paths {
        let p = path?;
        // do not try to load directories
        if p.file_type()?.is_file() {
            let pathbuf = p.path();
            let ext = match pathbuf.extension().and_then(|ext| ext.to_str()) {
                Some(ext) => ext,
                None => continue,
            };

            // state files end in .state
            if ext == "state" {
                if let Some(str_id) =
                    pathbuf.file_stem().and_then(|stem| stem.to_str())
                {

                    // state file names should parse to usize
                    match str_id.parse::<usize>() {
                        Ok(id) => state_ids.push(id),
                        Err(..) => {
                            let path_str = pathbuf
                                .into_os_string()
                                .into_string()
                                .unwrap_or_else(|_| {
                                    String::from("<InvalidString>")
                                });
                            return Err(Error::StateFileNameInvalid(path_str));
                        }
                    }
                } else {
                    continue;
                }
            }
        }
    }

    state_ids.sort_unstable();
    Ok(state_ids)
}

pub fn save_state<P: AsRef<Path>>(
    path: P,
    state: &LatentState,
    state_id: usize,
    file_config: &FileConfig,
) -> Result<(), Error> {
    path_validator(path.as_ref())?;
    let state_path = get_state_path(path, state_id);

    let serialized_type = file_config.serialized_type;

    save(state, state_path.as_path(), serialized_type)?;

    info!("State {} saved to {:?}", state_id, state_path);
    Ok(())
}

/// Save all the states. Assumes the codebook exists.
pub(crate) fn save_states<P: AsRef<Path>>(
    path: P,
    states: &[LatentState],
    state_ids: &[usize],
    file_config: &FileConfig,
) -> Result<(), Error> {
    if states.len() != state_ids.len() {
        return Err(Error::StateIdsMismatch {
            n_ids: state_ids.len(),
            n_states: states.len(),
        });
    }
    path_validator(path.as_ref())?;
    states
        .iter()
        .zip(state_ids.iter())
        .try_for_each(|(state, id)| {
            save_state(path.as_ref(), state, *id, file_config)
        })
}

pub(crate) fn load_state<P: AsRef<Path>>(
    path: P,
    state_id: usize,
    file_config: &FileConfig,
) -> Result<LatentState, Error> {
    let state_path = get_state_path(path, state_id);
    info!("Loading state at {:?}...", state_path);
    load(state_path, file_config.serialized_type)
}

/// Return (states, state_ids) tuple
pub(crate) fn load_states<P: AsRef<Path>>(
    path: P,
    file_config: &FileConfig,
) -> Result<(Vec<LatentState>, Vec<usize>), Error> {
    let path = path.as_ref();
    let state_ids = get_state_ids(path)?;
    let states: Result<Vec<_>, Error> = state_ids
        .par_iter()
        .map(|&id| load_state(path, id, file_config))
        .collect();

    info!("States loaded");
    states.map(|s| (s, state_ids))
}

pub(crate) fn save_codebook<P: AsRef<Path>>(
    path: P,
    codebook: &Codebook,
    file_config: &FileConfig,
) -> Result<(), Error> {
    path_validator(path.as_ref())?;
    let serialized_type = file_config.serialized_type;
    let cb_path = get_codebook_path(path, serialized_type);
    save(codebook, cb_path, serialized_type)
}

pub(crate) fn load_codebook<P: AsRef<Path>>(
    path: P,
    file_config: &FileConfig,
) -> Result<Codebook, Error> {
    let serialized_type = file_config.serialized_type;
    let cb_path = get_codebook_path(path, serialized_type);
    info!("Loading codebook at {:?}...", cb_path);
    load(cb_path, serialized_type)
}

pub(crate) fn save_rng<P: AsRef<Path>>(
    path: P,
    rng: &Xoshiro256Plus,
) -> Result<(), Error> {
    path_validator(path.as_ref())?;
    let rng_path = get_rng_path(path);
    save(&rng, rng_path, SerializedType::Yaml)
}

pub(crate) fn load_rng<P: AsRef<Path>>(
    path: P,
) -> Result<Xoshiro256Plus, Error> {
    let rng_path = get_rng_path(path);
    info!("Loading RNG at {:?}...", rng_path);
    load(rng_path, SerializedType::Yaml)
}

/// Load the file config
pub fn load_file_config<P: AsRef<Path>>(path: P) -> Result<FileConfig, Error> {
    let config_path = get_config_path(path);
    load(config_path, SerializedType::Yaml)
}

/// Save the file config
pub fn save_file_config<P: AsRef<Path>>(
    path: P,
    file_config: &FileConfig,
) -> Result<(), Error> {
    let config_path = get_config_path(path);
    save(&file_config, config_path, SerializedType::Yaml)
}
