use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use prida_deconv::{
    coarse_to_fine::initial_latent, kernel::Kernel, optimizer::OptimizerState,
    pyramid::build_pyramid, BlindDeconvConfig,
};
use prida_image::{Image, ImageSize};

fn bench_optimizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("Optimizer");

    for (side, kernel_side) in [(63, 7), (127, 15), (255, 31)].iter() {
        group.throughput(criterion::Throughput::Elements((*side * *side) as u64));

        let parameter_string = format!("{}x{}_k{}", side, side, kernel_side);

        let kernel_size = ImageSize::square(*kernel_side);
        let observed_data = (0..(*side * *side * 3))
            .map(|x| (x % 31) as f64 / 31.0)
            .collect();
        let observed = Image::<f64, 3>::new(ImageSize::square(*side), observed_data).unwrap();

        let state = OptimizerState::new(
            initial_latent(&observed, kernel_size).unwrap(),
            Kernel::uniform(kernel_size).unwrap(),
        );

        group.bench_with_input(
            BenchmarkId::new("step_3c", &parameter_string),
            &(&observed, &state),
            |b, i| {
                let (observed, mut state) = (i.0, i.1.clone());
                b.iter(|| {
                    black_box(state.step(observed, 0.01)).unwrap();
                })
            },
        );

        let config = BlindDeconvConfig::new(kernel_size, 0.002);

        group.bench_with_input(
            BenchmarkId::new("build_pyramid_3c", &parameter_string),
            &(&observed, &config),
            |b, i| {
                let (observed, config) = (i.0, i.1);
                b.iter(|| {
                    black_box(build_pyramid(observed, config)).unwrap();
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_optimizer);
criterion_main!(benches);
