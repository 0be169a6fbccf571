// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SEISS Magnetospheric Particle Sensor, high energy (MPS-HI) L1b record.
//!
//! 1192 bytes, little-endian. Differential fluxes are laid out per telescope
//! (5 rows) by energy channel (10 electron / 11 proton columns).

use crate::bitfield::{Field, Scalar};

/// APID of the MPS-HI (proton medium/high) stream.
pub const APID: u16 = 0b100_0010_0001;

pub const RECORD_LEN: usize = 1192;

const TELESCOPES: usize = 5;
const ELECTRON_CHANNELS: usize = 10;
const PROTON_CHANNELS: usize = 11;

pub const LAYOUT: &[Field] = &[
    Field::array("diff_electron_fluxes_control", 0, 16, Scalar::U64),
    Field::matrix("diff_electron_fluxes", 16, Scalar::F32, TELESCOPES, ELECTRON_CHANNELS),
    Field::scalar("intg_electron_fluxes_control", 216, Scalar::U64),
    Field::array("intg_electron_fluxes", 224, 20, Scalar::F32),
    Field::array("diff_proton_fluxes_control", 244, 16, Scalar::U64),
    Field::matrix("diff_proton_fluxes", 260, Scalar::F32, TELESCOPES, PROTON_CHANNELS),
    Field::array("diff_electron_uncertainties_control", 480, 16, Scalar::U64),
    Field::matrix("diff_electron_uncertainties", 496, Scalar::F32, TELESCOPES, ELECTRON_CHANNELS),
    Field::scalar("intg_electron_uncertainties_control", 696, Scalar::U64),
    Field::array("intg_electron_uncertainties", 704, 20, Scalar::F32),
    Field::array("diff_proton_uncertainties_control", 724, 16, Scalar::U64),
    Field::matrix("diff_proton_uncertainties", 740, Scalar::F32, TELESCOPES, PROTON_CHANNELS),
    Field::array("diff_electron_flux_dqfs_control", 960, 16, Scalar::U64),
    Field::matrix("diff_electron_flux_dqfs", 976, Scalar::U8, TELESCOPES, ELECTRON_CHANNELS),
    Field::array("diff_proton_flux_dqfs_control", 1026, 16, Scalar::U64),
    Field::matrix("diff_proton_flux_dqfs", 1042, Scalar::U8, TELESCOPES, PROTON_CHANNELS),
    Field::scalar("intg_electron_flux_dqfs_control", 1097, Scalar::U64),
    Field::array("intg_electron_flux_dqfs", 1105, 5, Scalar::U8),
    Field::scalar("dos1_hi_let_dose", 1110, Scalar::F32),
    Field::scalar("dos1_hi_let_dqf", 1114, Scalar::U8),
    Field::scalar("dos2_hi_let_dose", 1115, Scalar::F32),
    Field::scalar("dos2_hi_let_dqf", 1119, Scalar::U8),
    Field::scalar("dos1_lo_let_dose", 1120, Scalar::F32),
    Field::scalar("dos1_lo_let_dqf", 1124, Scalar::U8),
    Field::scalar("dos2_lo_let_dose", 1125, Scalar::F32),
    Field::scalar("dos2_lo_let_dqf", 1129, Scalar::U8),
    Field::scalar("l1a_eng_data_flag", 1130, Scalar::U8),
    Field::scalar("l1a_proton_data_flag", 1131, Scalar::U8),
    Field::scalar("l1a_ele_data_flag", 1132, Scalar::U8),
    Field::scalar("l1a_dos_data_flag", 1133, Scalar::U8),
    Field::scalar("l1b_processing_flag", 1134, Scalar::U8),
    Field::scalar("n_blocks", 1135, Scalar::U8),
    Field::scalar("instrument_mode", 1136, Scalar::U8),
    Field::scalar("instrument_serial_number", 1137, Scalar::U8),
    Field::scalar("l1a_sci_data_timestamp", 1138, Scalar::F64),
    Field::scalar("quaternion_q0", 1146, Scalar::F32),
    Field::scalar("quaternion_q1", 1150, Scalar::F32),
    Field::scalar("quaternion_q2", 1154, Scalar::F32),
    Field::scalar("quaternion_q3", 1158, Scalar::F32),
    Field::scalar("ecef_x", 1162, Scalar::F32),
    Field::scalar("ecef_y", 1166, Scalar::F32),
    Field::scalar("ecef_z", 1170, Scalar::F32),
    Field::scalar("yaw_flip_flag", 1174, Scalar::U8),
    Field::scalar("eclipse_flag", 1175, Scalar::U8),
    Field::scalar("solar_array_current_control", 1176, Scalar::U64),
    Field::array("solar_array_current", 1184, 8, Scalar::U16),
];
