//! Test-only encoder building ensemble streams from record values.
#![allow(dead_code)]

use workhorse::ensemble::*;

pub const NUM_CELLS: u8 = 4;

fn put(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn velocity_bytes(v: Option<i16>) -> [u8; 2] {
    v.unwrap_or(BAD_VELOCITY).to_le_bytes()
}

pub fn encode_fixed_leader(fl: &FixedLeader) -> Vec<u8> {
    let mut buf = vec![0u8; FixedLeader::LEN];
    put(&mut buf, 0, &SectionType::FixedLeader.code().to_le_bytes());
    buf[2] = fl.cpu_firmware_version;
    buf[3] = fl.cpu_firmware_revision;
    let cfg = fl.system_configuration.bits().expect("valid system configuration");
    put(&mut buf, 4, &cfg.to_le_bytes());
    buf[6] = fl.real_sim_flag;
    buf[7] = fl.lag_length;
    buf[8] = fl.num_beams;
    buf[9] = fl.num_cells;
    put(&mut buf, 10, &fl.pings_per_ensemble.to_le_bytes());
    put(&mut buf, 12, &fl.depth_cell_length.to_le_bytes());
    put(&mut buf, 14, &fl.blank_after_transmit.to_le_bytes());
    buf[16] = fl.profiling_mode;
    buf[17] = fl.low_corr_threshold;
    buf[18] = fl.num_code_reps;
    buf[19] = fl.percent_good_minimum;
    put(&mut buf, 20, &fl.error_velocity_maximum.to_le_bytes());
    buf[22] = fl.tpp_minutes;
    buf[23] = fl.tpp_seconds;
    buf[24] = fl.tpp_hundredths;
    buf[25] = fl.coordinate_transform;
    put(&mut buf, 26, &fl.heading_alignment.to_le_bytes());
    put(&mut buf, 28, &fl.heading_bias.to_le_bytes());
    buf[30] = fl.sensor_source;
    buf[31] = fl.sensors_available;
    put(&mut buf, 32, &fl.bin1_distance.to_le_bytes());
    put(&mut buf, 34, &fl.xmit_pulse_length.to_le_bytes());
    buf[36] = fl.ref_layer_start_cell;
    buf[37] = fl.ref_layer_end_cell;
    buf[38] = fl.false_target_threshold;
    put(&mut buf, 40, &fl.transmit_lag_distance.to_le_bytes());
    put(&mut buf, 42, &fl.cpu_board_serial_number.to_le_bytes());
    put(&mut buf, 50, &fl.system_bandwidth.to_le_bytes());
    buf[52] = fl.system_power;
    put(&mut buf, 54, &fl.serial_number.unwrap_or_default().to_le_bytes());
    buf[58] = fl.beam_angle.unwrap_or_default();
    buf
}

pub fn encode_variable_leader(vl: &VariableLeader) -> Vec<u8> {
    let mut buf = vec![0u8; VariableLeader::LEN];
    put(&mut buf, 0, &SectionType::VariableLeader.code().to_le_bytes());
    put(&mut buf, 2, &vl.ensemble_number_lsb.to_le_bytes());
    put(
        &mut buf,
        4,
        &[
            vl.rtc_year,
            vl.rtc_month,
            vl.rtc_day,
            vl.rtc_hour,
            vl.rtc_minute,
            vl.rtc_second,
            vl.rtc_hundredths,
            vl.ensemble_number_msb,
        ],
    );
    put(&mut buf, 12, &vl.bit_result.to_le_bytes());
    put(&mut buf, 14, &vl.speed_of_sound.to_le_bytes());
    put(&mut buf, 16, &vl.depth_of_transducer.to_le_bytes());
    put(&mut buf, 18, &vl.heading.to_le_bytes());
    put(&mut buf, 20, &vl.pitch.to_le_bytes());
    put(&mut buf, 22, &vl.roll.to_le_bytes());
    put(&mut buf, 24, &vl.salinity.to_le_bytes());
    put(&mut buf, 26, &vl.temperature.to_le_bytes());
    put(
        &mut buf,
        28,
        &[
            vl.mpt_minutes,
            vl.mpt_seconds,
            vl.mpt_hundredths,
            vl.heading_std_dev,
            vl.pitch_std_dev,
            vl.roll_std_dev,
        ],
    );
    put(&mut buf, 34, &vl.adc_channels);
    put(&mut buf, 42, &vl.error_status_word.to_le_bytes());
    put(&mut buf, 48, &vl.pressure.to_le_bytes());
    put(&mut buf, 52, &vl.pressure_variance.to_le_bytes());
    put(
        &mut buf,
        57,
        &[
            vl.y2k_century,
            vl.y2k_year,
            vl.y2k_month,
            vl.y2k_day,
            vl.y2k_hour,
            vl.y2k_minute,
            vl.y2k_second,
            vl.y2k_hundredths,
        ],
    );
    buf
}

pub fn encode_velocity(vel: &VelocityRecord) -> Vec<u8> {
    let mut buf = SectionType::Velocity.code().to_le_bytes().to_vec();
    for cell in 0..vel.beam1.len() {
        for beam in vel.beams() {
            buf.extend(velocity_bytes(beam[cell]));
        }
    }
    buf
}

pub fn encode_beam_array(arr: &BeamArrayRecord) -> Vec<u8> {
    let mut buf = arr.kind.code().to_le_bytes().to_vec();
    for cell in 0..arr.beam1.len() {
        for beam in arr.beams() {
            buf.push(beam[cell]);
        }
    }
    buf
}

pub fn encode_bottom_track(bt: &BottomTrack) -> Vec<u8> {
    let mut buf = vec![0u8; BottomTrack::LEN];
    put(&mut buf, 0, &SectionType::BottomTrack.code().to_le_bytes());
    put(&mut buf, 2, &bt.pings_per_ensemble.to_le_bytes());
    put(&mut buf, 4, &bt.delay_before_reacquire.to_le_bytes());
    put(
        &mut buf,
        6,
        &[
            bt.corr_mag_minimum,
            bt.eval_amp_minimum,
            bt.percent_good_minimum,
            bt.mode,
        ],
    );
    put(&mut buf, 10, &bt.error_velocity_maximum.to_le_bytes());
    for i in 0..4 {
        put(&mut buf, 16 + 2 * i, &bt.range[i].to_le_bytes());
        put(&mut buf, 24 + 2 * i, &velocity_bytes(bt.velocity[i]));
        put(&mut buf, 50 + 2 * i, &velocity_bytes(bt.ref_velocity[i]));
    }
    put(&mut buf, 32, &bt.correlation);
    put(&mut buf, 36, &bt.eval_amp);
    put(&mut buf, 40, &bt.percent_good);
    put(&mut buf, 44, &bt.ref_layer_minimum.to_le_bytes());
    put(&mut buf, 46, &bt.ref_layer_near.to_le_bytes());
    put(&mut buf, 48, &bt.ref_layer_far.to_le_bytes());
    put(&mut buf, 58, &bt.ref_correlation);
    put(&mut buf, 62, &bt.ref_intensity);
    put(&mut buf, 66, &bt.ref_percent_good);
    put(&mut buf, 70, &bt.max_depth.to_le_bytes());
    put(&mut buf, 72, &bt.rssi_amp);
    buf[76] = bt.gain;
    put(&mut buf, 77, &bt.range_msb);
    buf
}

/// Frame encoded sections into an ensemble: header, offset table, sections, checksum.
pub fn encode_ensemble(sections: &[Vec<u8>]) -> Vec<u8> {
    let header_len = 6 + 2 * sections.len();
    let len = header_len + sections.iter().map(Vec::len).sum::<usize>();
    let mut buf = vec![0x7f, 0x7f];
    buf.extend(u16::try_from(len).expect("ensemble too long").to_le_bytes());
    buf.push(0); // spare
    buf.push(u8::try_from(sections.len()).expect("too many sections"));
    let mut offset = header_len;
    for section in sections {
        buf.extend((offset as u16).to_le_bytes());
        offset += section.len();
    }
    for section in sections {
        buf.extend(section);
    }
    buf.extend(checksum(&buf).to_le_bytes());
    buf
}

pub fn checksum(dat: &[u8]) -> u16 {
    let sum: u32 = dat.iter().map(|b| u32::from(*b)).sum();
    (sum & 0xffff) as u16
}

pub fn sample_fixed_leader(version: u8, revision: u8) -> FixedLeader {
    let has_serial = (version, revision) >= FixedLeader::SERIAL_FIRMWARE;
    FixedLeader {
        cpu_firmware_version: version,
        cpu_firmware_revision: revision,
        system_configuration: SystemConfiguration {
            lsb: "11001010".into(),
            msb: "01000001".into(),
        },
        real_sim_flag: 0,
        lag_length: 13,
        num_beams: 4,
        num_cells: NUM_CELLS,
        pings_per_ensemble: 60,
        depth_cell_length: 50,
        blank_after_transmit: 176,
        profiling_mode: 1,
        low_corr_threshold: 64,
        num_code_reps: 5,
        percent_good_minimum: 0,
        error_velocity_maximum: 2000,
        tpp_minutes: 0,
        tpp_seconds: 1,
        tpp_hundredths: 0,
        coordinate_transform: 0x1f,
        heading_alignment: -100,
        heading_bias: 100,
        sensor_source: 0x7d,
        sensors_available: 0x3d,
        bin1_distance: 215,
        xmit_pulse_length: 78,
        ref_layer_start_cell: 1,
        ref_layer_end_cell: 5,
        false_target_threshold: 50,
        transmit_lag_distance: 15,
        cpu_board_serial_number: 0x0102_0304_0506_0708,
        system_bandwidth: 1,
        system_power: 255,
        serial_number: has_serial.then_some(12345),
        beam_angle: has_serial.then_some(20),
    }
}

pub fn sample_variable_leader(idx: u16) -> VariableLeader {
    let second = (idx % 60) as u8;
    VariableLeader {
        ensemble_number_lsb: idx.wrapping_add(1),
        rtc_year: 24,
        rtc_month: 3,
        rtc_day: 15,
        rtc_hour: 12,
        rtc_minute: 30,
        rtc_second: second,
        rtc_hundredths: 0,
        ensemble_number_msb: 0,
        bit_result: 0,
        speed_of_sound: 1500,
        depth_of_transducer: 100,
        heading: 10000 + idx,
        pitch: -500,
        roll: 250,
        salinity: 35,
        temperature: 1000,
        mpt_minutes: 0,
        mpt_seconds: 0,
        mpt_hundredths: 50,
        heading_std_dev: 1,
        pitch_std_dev: 2,
        roll_std_dev: 3,
        adc_channels: [0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17],
        error_status_word: 0,
        pressure: -5 + i32::from(idx),
        pressure_variance: 10,
        y2k_century: 20,
        y2k_year: 24,
        y2k_month: 3,
        y2k_day: 15,
        y2k_hour: 12,
        y2k_minute: 30,
        y2k_second: second,
        y2k_hundredths: 0,
    }
}

pub fn sample_velocity(idx: u16) -> VelocityRecord {
    let beam = |b: i16| -> Vec<Option<i16>> {
        (0..NUM_CELLS as i16)
            .map(|cell| Some(idx as i16 * 10 + b * 100 + cell))
            .collect()
    };
    VelocityRecord {
        beam1: vec![Some(100), Some(-200), Some(300), None],
        beam2: beam(2),
        beam3: beam(3),
        beam4: beam(4),
    }
}

pub fn sample_beam_array(idx: u16, kind: SectionType) -> BeamArrayRecord {
    let beam = |b: u8| -> Vec<u8> {
        (0..NUM_CELLS)
            .map(|cell| (idx as u8).wrapping_add(b * 40 + cell))
            .collect()
    };
    BeamArrayRecord {
        kind,
        beam1: beam(1),
        beam2: beam(2),
        beam3: beam(3),
        beam4: beam(4),
    }
}

pub fn sample_bottom_track(idx: u16) -> BottomTrack {
    BottomTrack {
        pings_per_ensemble: 1,
        delay_before_reacquire: 0,
        corr_mag_minimum: 220,
        eval_amp_minimum: 30,
        percent_good_minimum: 0,
        mode: 5,
        error_velocity_maximum: 1000,
        range: [1000 + idx, 2000, 3000, 4000],
        velocity: [Some(10), Some(-10), None, Some(0)],
        correlation: [0xfa, 0xfb, 0xfc, 0xfd],
        eval_amp: [0x50, 0x51, 0x52, 0x53],
        percent_good: [100; 4],
        ref_layer_minimum: 20,
        ref_layer_near: 10,
        ref_layer_far: 30,
        ref_velocity: [None, Some(1), Some(2), Some(3)],
        ref_correlation: [1, 2, 3, 4],
        ref_intensity: [5, 6, 7, 8],
        ref_percent_good: [9, 10, 11, 12],
        max_depth: 2000,
        rssi_amp: [0x20, 0x21, 0x22, 0x23],
        gain: 1,
        range_msb: [0, 1, 0, 0],
    }
}

/// Record values for a single ensemble with every section present.
#[derive(Debug, Clone)]
pub struct Sample {
    pub variable_leader: VariableLeader,
    pub velocity: VelocityRecord,
    pub correlation: BeamArrayRecord,
    pub echo_intensity: BeamArrayRecord,
    pub percent_good: BeamArrayRecord,
    pub bottom_track: BottomTrack,
}

impl Sample {
    pub fn new(idx: u16) -> Self {
        Sample {
            variable_leader: sample_variable_leader(idx),
            velocity: sample_velocity(idx),
            correlation: sample_beam_array(idx, SectionType::Correlation),
            echo_intensity: sample_beam_array(idx, SectionType::EchoIntensity),
            percent_good: sample_beam_array(idx, SectionType::PercentGood),
            bottom_track: sample_bottom_track(idx),
        }
    }

    pub fn sections(&self, fl: &FixedLeader) -> Vec<Vec<u8>> {
        vec![
            encode_fixed_leader(fl),
            encode_variable_leader(&self.variable_leader),
            encode_velocity(&self.velocity),
            encode_beam_array(&self.correlation),
            encode_beam_array(&self.echo_intensity),
            encode_beam_array(&self.percent_good),
            encode_bottom_track(&self.bottom_track),
        ]
    }

    pub fn encode(&self, fl: &FixedLeader) -> Vec<u8> {
        encode_ensemble(&self.sections(fl))
    }

    /// Assert `ensemble` decoded to exactly these values.
    pub fn assert_matches(&self, ensemble: &Ensemble) {
        assert_eq!(ensemble.variable_leader, self.variable_leader);
        assert_eq!(ensemble.velocity.as_ref(), Some(&self.velocity));
        assert_eq!(ensemble.correlation.as_ref(), Some(&self.correlation));
        assert_eq!(ensemble.echo_intensity.as_ref(), Some(&self.echo_intensity));
        assert_eq!(ensemble.percent_good.as_ref(), Some(&self.percent_good));
        assert_eq!(ensemble.bottom_track.as_ref(), Some(&self.bottom_track));
    }
}

/// Samples for `num` ensembles and the stream encoding them.
pub fn sample_stream(fl: &FixedLeader, num: u16) -> (Vec<Sample>, Vec<u8>) {
    let samples: Vec<Sample> = (0..num).map(Sample::new).collect();
    let dat = samples.iter().flat_map(|s| s.encode(fl)).collect();
    (samples, dat)
}
