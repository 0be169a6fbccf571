// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SEISS Magnetospheric Particle Sensor, low energy (MPS-LO) L1b record.
//!
//! 3937 bytes, little-endian. Flux, uncertainty and DQF blocks are 14
//! angular zones by 15 energy bands.

use crate::bitfield::{Field, Scalar};

/// APID of the MPS-LO (proton low) stream.
pub const APID: u16 = 0b100_0001_0000;

pub const RECORD_LEN: usize = 3937;

const ZONES: usize = 14;
const BANDS: usize = 15;

pub const LAYOUT: &[Field] = &[
    Field::array("diff_electron_fluxes_control", 0, 16, Scalar::U64),
    Field::matrix("diff_electron_fluxes", 16, Scalar::F32, ZONES, BANDS),
    Field::array("diff_electron_flux_dqfs_control", 856, 16, Scalar::U64),
    Field::matrix("diff_electron_flux_dqfs", 872, Scalar::U8, ZONES, BANDS),
    Field::array("diff_ion_fluxes_control", 1082, 16, Scalar::U64),
    Field::matrix("diff_ion_fluxes", 1098, Scalar::F32, ZONES, BANDS),
    Field::array("diff_ion_flux_dqfs_control", 1938, 16, Scalar::U64),
    Field::matrix("diff_ion_flux_dqfs", 1954, Scalar::U8, ZONES, BANDS),
    Field::array("diff_electron_uncertainties_control", 2164, 16, Scalar::U64),
    Field::matrix("diff_electron_uncertainties", 2180, Scalar::F32, ZONES, BANDS),
    Field::array("diff_ion_uncertainties_control", 3020, 16, Scalar::U64),
    Field::matrix("diff_ion_uncertainties", 3036, Scalar::F32, ZONES, BANDS),
    Field::scalar("l1a_eng_data_flag", 3876, Scalar::U8),
    Field::scalar("l1a_ion_data_flag", 3877, Scalar::U8),
    Field::scalar("l1a_ele_data_flag", 3878, Scalar::U8),
    Field::scalar("l1b_processing_flag", 3879, Scalar::U8),
    Field::scalar("n_blocks", 3880, Scalar::U8),
    Field::scalar("instrument_mode", 3881, Scalar::U8),
    Field::scalar("instrument_serial_number", 3882, Scalar::U8),
    Field::scalar("l1a_sci_data_timestamp", 3883, Scalar::F64),
    Field::scalar("quaternion_q0", 3891, Scalar::F32),
    Field::scalar("quaternion_q1", 3895, Scalar::F32),
    Field::scalar("quaternion_q2", 3899, Scalar::F32),
    Field::scalar("quaternion_q3", 3903, Scalar::F32),
    Field::scalar("ecef_x", 3907, Scalar::F32),
    Field::scalar("ecef_y", 3911, Scalar::F32),
    Field::scalar("ecef_z", 3915, Scalar::F32),
    Field::scalar("yaw_flip_flag", 3919, Scalar::U8),
    Field::scalar("eclipse_flag", 3920, Scalar::U8),
    Field::array("solar_array_current_1", 3921, 8, Scalar::U16),
    Field::array("solar_array_current_2", 3929, 8, Scalar::U16),
];
