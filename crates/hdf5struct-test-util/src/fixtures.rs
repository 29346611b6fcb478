use std::path::{Path, PathBuf};

use hdf5::{Group, H5Type, types::VarLenUnicode};
use ndarray::{Array, Dimension};
use tempfile::TempDir;
use testresult::TestResult;

/// A freshly written HDF5 file living in a temporary directory
pub struct Fixture {
    // Held so the directory outlives the path
    _dir: TempDir,
    path: PathBuf,
}

impl Fixture {
    /// Create an empty HDF5 file named `file_name` and let `build` populate its root group
    pub fn build(file_name: &str, build: impl FnOnce(&Group) -> hdf5::Result<()>) -> TestResult<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(file_name);
        let file = hdf5::File::create(&path)?;
        build(&file)?;
        file.close()?;
        log::debug!("Wrote fixture {}", path.display());
        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Defines a function returning a [`Fixture`] written by the given builder function
macro_rules! define_fixture {
    ($name:ident, $file_name:expr, $builder:path) => {
        pub fn $name() -> testresult::TestResult<$crate::fixtures::Fixture> {
            $crate::fixtures::Fixture::build($file_name, $builder)
        }
    };
}

pub fn write_array<T: H5Type, D: Dimension>(
    group: &Group,
    name: &str,
    data: &Array<T, D>,
) -> hdf5::Result<()> {
    group.new_dataset_builder().with_data(data).create(name)?;
    Ok(())
}

pub fn write_scalar<T: H5Type>(group: &Group, name: &str, value: &T) -> hdf5::Result<()> {
    group.new_dataset::<T>().shape(()).create(name)?.write_scalar(value)
}

pub fn varlen(s: &str) -> hdf5::Result<VarLenUnicode> {
    s.parse::<VarLenUnicode>()
        .map_err(|e| hdf5::Error::from(format!("invalid string '{s}': {e}")))
}

pub fn write_str(group: &Group, name: &str, value: &str) -> hdf5::Result<()> {
    write_scalar(group, name, &varlen(value)?)
}

pub fn write_strs(group: &Group, name: &str, values: &[&str]) -> hdf5::Result<()> {
    let values = values
        .iter()
        .map(|s| varlen(s))
        .collect::<hdf5::Result<Vec<_>>>()?;
    write_array(group, name, &ndarray::Array1::from(values))
}

pub mod empty {
    use hdf5::Group;

    fn build_empty(_root: &Group) -> hdf5::Result<()> {
        Ok(())
    }

    define_fixture!(empty_file, "empty.h5", build_empty);
}

/// An EEGLAB-style dataset as saved by MATLAB with `-v7.3`
pub mod eeg {
    use hdf5::{
        Group, H5Type, ObjectReference1,
        types::{FixedAscii, VarLenArray, VarLenUnicode},
    };
    use ndarray::{Array1, array};

    use super::{varlen, write_array, write_scalar, write_str, write_strs};

    pub const EEG_GROUP: &str = "EEG";
    pub const EEG_DATA: [[f64; 3]; 2] = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
    pub const EEG_SRATE: f64 = 256.0;
    pub const EEG_NBCHAN: i32 = 2;
    pub const EEG_SETNAME: &str = "subject01";
    pub const EEG_REF: &str = "average";
    pub const EEG_LABELS: [&str; 2] = ["Fz", "Cz"];
    pub const EEG_RADIUS: [f32; 2] = [0.25, 0.5];
    pub const EEG_FLAGS: [u8; 3] = [1, 0, 1];
    pub const EEG_REJECTED: [bool; 2] = [false, true];
    pub const VERSION: [i32; 2] = [7, 3];
    pub const EEG_THETA: [f64; 2] = [0.0, 90.0];
    pub const EEG_SPH: [[f64; 3]; 2] = [[0.0, 0.7, 0.7], [0.0, 0.0, 1.0]];
    pub const EEG_URCHAN: [i32; 2] = [1, 2];
    /// Channel number next to each channel
    pub const EEG_NEIGHBORS: [u16; 2] = [2, 1];
    pub const EEG_CHANNEL_TYPES: [ChannelType; 2] = [ChannelType::Eeg, ChannelType::Eog];
    /// Datasets the entries of `EEG/comments` refer to
    pub const EEG_COMMENT_TARGETS: [&str; 2] = ["setname", "ref"];

    #[derive(H5Type, Clone, Copy, Debug, PartialEq, Eq)]
    #[repr(u8)]
    pub enum ChannelType {
        Eeg = 1,
        Eog = 2,
    }

    /// A row of `EEG/chanlocs_table`, the channel locations stored as one compound dataset
    #[derive(H5Type, Clone, Debug)]
    #[repr(C)]
    pub struct ChanLoc {
        pub labels: VarLenUnicode,
        pub theta: f64,
        pub radius: f32,
        pub sph: [f64; 3],
        pub urchan: i32,
        pub kind: ChannelType,
        pub neighbors: VarLenArray<u16>,
    }

    fn chanlocs_table() -> hdf5::Result<Vec<ChanLoc>> {
        (0..EEG_LABELS.len())
            .map(|i| -> hdf5::Result<ChanLoc> {
                Ok(ChanLoc {
                    labels: varlen(EEG_LABELS[i])?,
                    theta: EEG_THETA[i],
                    radius: EEG_RADIUS[i],
                    sph: EEG_SPH[i],
                    urchan: EEG_URCHAN[i],
                    kind: EEG_CHANNEL_TYPES[i],
                    neighbors: VarLenArray::from_slice(&[EEG_NEIGHBORS[i]]),
                })
            })
            .collect()
    }

    /// Top level entries of [`matlab_eeg`]
    pub const EEG_FILE_ENTRIES: [&str; 2] = [EEG_GROUP, "version"];
    /// Entries of the `EEG` group in [`matlab_eeg`]
    pub const EEG_GROUP_ENTRIES: [&str; 11] = [
        "chanlocs",
        "chanlocs_table",
        "comments",
        "data",
        "event",
        "flags",
        "nbchan",
        "ref",
        "rejected",
        "setname",
        "srate",
    ];

    fn build_matlab_eeg(root: &Group) -> hdf5::Result<()> {
        let eeg = root.create_group(EEG_GROUP)?;
        let data = array![
            [EEG_DATA[0][0], EEG_DATA[0][1], EEG_DATA[0][2]],
            [EEG_DATA[1][0], EEG_DATA[1][1], EEG_DATA[1][2]]
        ];
        write_array(&eeg, "data", &data)?;
        write_scalar(&eeg, "srate", &EEG_SRATE)?;
        write_scalar(&eeg, "nbchan", &EEG_NBCHAN)?;
        write_str(&eeg, "setname", EEG_SETNAME)?;
        let reference = FixedAscii::<8>::from_ascii(EEG_REF)
            .map_err(|e| hdf5::Error::from(format!("invalid ascii: {e}")))?;
        write_scalar(&eeg, "ref", &reference)?;
        write_array(&eeg, "flags", &Array1::from(EEG_FLAGS.to_vec()))?;
        write_array(&eeg, "rejected", &Array1::from(EEG_REJECTED.to_vec()))?;
        eeg.create_group("event")?;
        // MATLAB keeps cell arrays as object references
        let comments = EEG_COMMENT_TARGETS
            .iter()
            .map(|name| eeg.reference::<ObjectReference1>(name))
            .collect::<hdf5::Result<Vec<_>>>()?;
        write_array(&eeg, "comments", &Array1::from(comments))?;
        write_array(&eeg, "chanlocs_table", &Array1::from(chanlocs_table()?))?;

        let chanlocs = eeg.create_group("chanlocs")?;
        write_strs(&chanlocs, "labels", &EEG_LABELS)?;
        write_array(&chanlocs, "radius", &Array1::from(EEG_RADIUS.to_vec()))?;
        write_array(&chanlocs, "xyz", &Array1::from(EEG_SPH.to_vec()))?;

        write_array(root, "version", &Array1::from(VERSION.to_vec()))
    }

    define_fixture!(matlab_eeg, "eeg.mat", build_matlab_eeg);
}

/// Output of a PREP pipeline run, the parameters live under `/noisyParameters`
pub mod noisy_parameters {
    use hdf5::Group;
    use ndarray::Array1;

    use super::{write_array, write_scalar, write_str};

    pub const NOISY_PARAMETERS_GROUP: &str = "noisyParameters";
    pub const NOISY_PARAMETERS_NAME: &str = "EEG.set";
    pub const REFERENCE_CHANNELS: [i32; 4] = [1, 2, 3, 4];
    pub const BAD_CHANNELS: [i32; 1] = [3];
    pub const HIGH_PASS_CUTOFF: f64 = 1.0;
    pub const LINE_FREQUENCIES: [f64; 3] = [60.0, 120.0, 180.0];

    /// Entries of `/noisyParameters` in [`noisy_parameters`]
    pub const NOISY_PARAMETERS_ENTRIES: [&str; 4] = ["highPass", "lineNoise", "name", "reference"];

    fn build_noisy_parameters(root: &Group) -> hdf5::Result<()> {
        write_str(root, "README", "PREP pipeline output")?;
        let params = root.create_group(NOISY_PARAMETERS_GROUP)?;
        write_str(&params, "name", NOISY_PARAMETERS_NAME)?;

        let high_pass = params.create_group("highPass")?;
        write_scalar(&high_pass, "highPassCutoff", &HIGH_PASS_CUTOFF)?;

        let line_noise = params.create_group("lineNoise")?;
        write_array(
            &line_noise,
            "lineFrequencies",
            &Array1::from(LINE_FREQUENCIES.to_vec()),
        )?;

        let reference = params.create_group("reference")?;
        write_array(
            &reference,
            "referenceChannels",
            &Array1::from(REFERENCE_CHANNELS.to_vec()),
        )?;
        let noisy_channels = reference
            .create_group("noisyStatistics")?
            .create_group("noisyChannels")?;
        write_array(
            &noisy_channels,
            "badChannelsFromDeviation",
            &Array1::from(BAD_CHANNELS.to_vec()),
        )
    }

    define_fixture!(noisy_parameters, "noisy_parameters.h5", build_noisy_parameters);
}
