//! Property-based tests for tribecal-analysis.
//!
//! Checks the structural invariants of the spectrum, the symmetry of the
//! correlation metrics, and the determinism of harmonic lookup.

use proptest::prelude::*;
use tribecal_analysis::{AudioBuffer, analyze_spectrum, compare, find_harmonics};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The frequency axis is strictly ascending and half the effective window long.
    #[test]
    fn spectrum_axis_ascending(
        samples in prop::collection::vec(-1.0f32..=1.0f32, 2..3000),
        window_exp in 1u32..12,
        sample_rate in prop::sample::select(vec![22050u32, 44100, 48000, 96000]),
    ) {
        let window_size = 1usize << window_exp;
        let buffer = AudioBuffer::new(samples.clone(), sample_rate).unwrap();
        let spectrum = analyze_spectrum(&buffer, window_size).unwrap();

        let effective = window_size.min(samples.len());
        prop_assert_eq!(spectrum.window_size, effective);
        prop_assert_eq!(spectrum.len(), effective / 2);
        prop_assert_eq!(spectrum.magnitude_db.len(), spectrum.frequencies.len());
        for pair in spectrum.frequencies.windows(2) {
            prop_assert!(pair[0] < pair[1], "axis not ascending: {} then {}", pair[0], pair[1]);
        }
        for &m in &spectrum.magnitude_db {
            prop_assert!(!m.is_nan());
        }
    }

    /// Swapping reference and candidate leaves both correlations unchanged.
    #[test]
    fn correlation_symmetric(
        a in prop::collection::vec(-1.0f32..=1.0f32, 8..512),
        b in prop::collection::vec(-1.0f32..=1.0f32, 8..512),
    ) {
        let a = AudioBuffer::new(a, 48000).unwrap();
        let b = AudioBuffer::new(b, 48000).unwrap();
        let ab = compare(&a, &b);
        let ba = compare(&b, &a);

        prop_assert!(
            ab.time_correlation == ba.time_correlation
                || (ab.time_correlation.is_nan() && ba.time_correlation.is_nan())
        );
        prop_assert!(
            ab.spectral_correlation == ba.spectral_correlation
                || (ab.spectral_correlation.is_nan() && ba.spectral_correlation.is_nan())
        );
        prop_assert_eq!(ab.rms_error, ba.rms_error);
    }

    /// Harmonic lookup gives identical entries when repeated.
    #[test]
    fn harmonics_idempotent(
        samples in prop::collection::vec(-1.0f32..=1.0f32, 64..2048),
        fundamental in prop::option::of(20.0f32..5000.0f32),
    ) {
        let buffer = AudioBuffer::new(samples, 44100).unwrap();
        let spectrum = analyze_spectrum(&buffer, 512).unwrap();

        let first = find_harmonics(&spectrum, fundamental).unwrap();
        let second = find_harmonics(&spectrum, fundamental).unwrap();
        prop_assert_eq!(first, second);
    }
}
