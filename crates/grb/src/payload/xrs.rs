// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! EXIS X-Ray Sensor (XRS) L1b science record, 271 bytes little-endian.

use crate::bitfield::{Field, Scalar};

/// APID of the XRS L1b stream.
pub const APID: u16 = 0b011_1000_0011;

/// Record length in bytes.
pub const RECORD_LEN: usize = 271;

pub const LAYOUT: &[Field] = &[
    Field::scalar("irradiance_xrsa1", 0, Scalar::F32),
    Field::scalar("irradiance_xrsa2", 4, Scalar::F32),
    Field::scalar("primary_xrsa", 8, Scalar::U8),
    Field::scalar("irradiance_xrsb1", 9, Scalar::F32),
    Field::scalar("irradiance_xrsb2", 13, Scalar::F32),
    Field::scalar("primary_xrsb", 17, Scalar::U8),
    Field::scalar("xrs_ratio", 18, Scalar::F32),
    Field::scalar("corrected_current_xrsa_1", 22, Scalar::F32),
    Field::scalar("corrected_current_xrsa_2", 26, Scalar::F32),
    Field::scalar("corrected_current_xrsa_3", 30, Scalar::F32),
    Field::scalar("corrected_current_xrsa_4", 34, Scalar::F32),
    Field::scalar("corrected_current_xrsb_1", 38, Scalar::F32),
    Field::scalar("corrected_current_xrsb_2", 42, Scalar::F32),
    Field::scalar("corrected_current_xrsb_3", 46, Scalar::F32),
    Field::scalar("corrected_current_xrsb_4", 50, Scalar::F32),
    Field::scalar("dispersion_angle", 54, Scalar::F32),
    Field::scalar("crossdispersion_angle", 58, Scalar::F32),
    Field::scalar("sc_power_side", 62, Scalar::U8),
    Field::scalar("exis_flight_model", 63, Scalar::U8),
    Field::scalar("exis_configuration_id", 64, Scalar::U16),
    Field::scalar("xrs_runctrlmd", 66, Scalar::U8),
    Field::scalar("integration_time", 67, Scalar::F32),
    Field::scalar("exs_sl_pwr_ena", 71, Scalar::U8),
    Field::scalar("asic1_temperature", 72, Scalar::F32),
    Field::scalar("asic2_temperature", 76, Scalar::F32),
    Field::scalar("invalid_flags", 80, Scalar::U8),
    Field::scalar("xrs_det_chg", 81, Scalar::U32),
    Field::scalar("xrs_mode", 85, Scalar::U8),
    Field::scalar("sps_obs_time_control_fields", 86, Scalar::U64),
    Field::array("sps_obs_time", 94, 32, Scalar::F64),
    Field::scalar("sps_int_time", 126, Scalar::U64),
    Field::array("sps_int_time_values", 134, 16, Scalar::F32),
    Field::scalar("sps_temperature", 150, Scalar::U64),
    Field::array("sps_temperature_values", 158, 16, Scalar::F32),
    Field::scalar("sps_det_chg", 174, Scalar::U64),
    Field::array("sps_det_chg_values", 182, 16, Scalar::U32),
    Field::scalar("num_angle_pairs", 198, Scalar::U16),
    Field::scalar("yaw_flip_flag", 200, Scalar::U8),
    Field::scalar("au_factor", 201, Scalar::F32),
    Field::scalar("quality_flags", 205, Scalar::U32),
    Field::scalar("time", 209, Scalar::F64),
    Field::scalar("packet_count", 217, Scalar::U32),
    Field::scalar("fov_unknown", 221, Scalar::U8),
    Field::scalar("fov_eclipse", 222, Scalar::U8),
    Field::scalar("fov_lunar_transit", 223, Scalar::U8),
    Field::scalar("fov_planet_transit", 224, Scalar::U8),
    Field::scalar("fov_off_point", 225, Scalar::U8),
    Field::scalar("quaternion_q0", 226, Scalar::F32),
    Field::scalar("quaternion_q1", 230, Scalar::F32),
    Field::scalar("quaternion_q2", 234, Scalar::F32),
    Field::scalar("quaternion_q3", 238, Scalar::F32),
    Field::scalar("ecef_x", 242, Scalar::F32),
    Field::scalar("ecef_y", 246, Scalar::F32),
    Field::scalar("ecef_z", 250, Scalar::F32),
    Field::scalar("solar_array_current_control_fields", 254, Scalar::U64),
    Field::array("solar_array_current", 262, 8, Scalar::U16),
    Field::scalar("sc_eclipse_flag", 270, Scalar::U8),
];
