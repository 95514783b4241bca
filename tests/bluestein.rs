use specfft::{Complex32, FftImpl, RealFft, ScalarFftImpl};

fn naive_dft(input: &[Complex32]) -> Vec<Complex32> {
    let n = input.len();
    (0..n)
        .map(|k| {
            let mut sum = Complex32::zero();
            for (j, &x) in input.iter().enumerate() {
                let angle = -2.0 * std::f32::consts::PI * ((j * k) % n) as f32 / n as f32;
                sum = sum.add(Complex32::expi(angle).mul(x));
            }
            sum
        })
        .collect()
}

#[test]
fn prime_lengths_match_naive_dft() {
    let fft = ScalarFftImpl::<f32>::default();
    for &n in &[37usize, 97, 101, 211, 509] {
        let input: Vec<Complex32> = (0..n)
            .map(|i| Complex32::new((i as f32 * 0.17).sin(), (i as f32 * 0.29).cos()))
            .collect();
        let mut data = input.clone();
        fft.fft(&mut data).unwrap();
        let reference = naive_dft(&input);
        for (k, (got, want)) in data.iter().zip(reference.iter()).enumerate() {
            assert!(
                (got.re - want.re).abs() < 1e-2 && (got.im - want.im).abs() < 1e-2,
                "n={} bin {}: {:?} vs {:?}",
                n,
                k,
                got,
                want
            );
        }
    }
}

#[test]
fn prime_length_inverse_restores_input() {
    let fft = ScalarFftImpl::<f32>::default();
    for &n in &[101usize, 509] {
        let input: Vec<Complex32> = (0..n)
            .map(|i| Complex32::new((i as f32 * 0.7).sin(), -(i as f32 * 0.3).sin()))
            .collect();
        let mut data = input.clone();
        fft.fft(&mut data).unwrap();
        fft.ifft(&mut data).unwrap();
        for (got, want) in data.iter().zip(input.iter()) {
            assert!((got.re - want.re).abs() < 1e-3);
            assert!((got.im - want.im).abs() < 1e-3);
        }
    }
}

#[test]
fn prime_length_real_transform_roundtrip() {
    for &n in &[37usize, 251] {
        let input: Vec<f32> = (0..n).map(|i| (i as f32 * 0.53).sin() * 2.0).collect();
        let rfft = RealFft::<f32>::new(n).unwrap();
        let mut data = input.clone();
        rfft.compute(&mut data).unwrap();
        rfft.inverse(&mut data).unwrap();
        for (got, want) in data.iter().zip(input.iter()) {
            assert!((got / n as f32 - want).abs() < 1e-3);
        }
    }
}
