//! Benchmarks for buffer processing operations
//!
//! Run with: cargo bench

use alazar_stream::processor::{GroupedAverage, RawCapture, StreamingAverage, WindowedChunk};
use alazar_stream::{
    reshape_channels, AcquisitionGeometry, BufferProcessor, Pipeline, PipelineSettings,
    Processor, RawBuffer, SampleWidth,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn geometry(records_per_buffer: usize) -> AcquisitionGeometry {
    AcquisitionGeometry::new(1024, records_per_buffer * 8, records_per_buffer, 2, SampleWidth::U8)
        .unwrap()
}

fn sawtooth_buffer(g: &AcquisitionGeometry) -> RawBuffer<u8> {
    RawBuffer::new((0..g.buffer_len()).map(|i| i as u8).collect())
}

fn bench_reshape(c: &mut Criterion) {
    let mut group = c.benchmark_group("reshape");

    for rpb in [16, 64, 256].iter() {
        let g = geometry(*rpb);
        let buf = sawtooth_buffer(&g);
        group.throughput(Throughput::Bytes(g.buffer_bytes() as u64));
        group.bench_with_input(BenchmarkId::new("channels", rpb), &buf, |b, buf| {
            b.iter(|| black_box(reshape_channels(buf.as_slice(), &g).unwrap()));
        });
    }

    group.finish();
}

fn bench_process_one_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_buffer");
    let g = geometry(64);
    let buf = sawtooth_buffer(&g);
    let views = buf.channels(&g).unwrap();
    group.throughput(Throughput::Bytes(g.buffer_bytes() as u64));

    group.bench_function("average", |b| {
        let mut p = StreamingAverage::new();
        // Re-initialized per iteration so buffer 0 is always admitted.
        b.iter(|| {
            p.initialize(&g);
            p.process(black_box(views.as_slice()), 0);
        });
    });

    group.bench_function("raw", |b| {
        let mut p = RawCapture::<u8>::new();
        b.iter(|| {
            p.initialize(&g);
            p.process(black_box(views.as_slice()), 0);
        });
    });

    for n in [1usize, 2, 16].iter() {
        group.bench_with_input(BenchmarkId::new("average_n", n), n, |b, &n| {
            let mut p = GroupedAverage::new(n).unwrap();
            b.iter(|| {
                p.initialize(&g);
                p.process(black_box(views.as_slice()), 0);
            });
        });
    }

    group.bench_function("chunk", |b| {
        let mut p = WindowedChunk::new(2, 0, 128).unwrap();
        b.iter(|| {
            p.initialize(&g);
            p.process(black_box(views.as_slice()), 0);
        });
    });

    group.finish();
}

fn bench_pipeline_acquisition(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    let g = geometry(64);
    let buffers: Vec<RawBuffer<u8>> = (0..g.buffers_per_acquisition())
        .map(|_| sawtooth_buffer(&g))
        .collect();
    group.throughput(Throughput::Bytes(
        (g.buffer_bytes() * g.buffers_per_acquisition()) as u64,
    ));

    group.bench_function("raw_and_average", |b| {
        b.iter(|| {
            let processors: Vec<Processor<u8>> =
                vec![RawCapture::new().into(), StreamingAverage::new().into()];
            let mut handle = Pipeline::new(g, processors, PipelineSettings::default())
                .unwrap()
                .start()
                .unwrap();
            for buf in buffers.iter().cloned() {
                handle.submit(buf).unwrap();
            }
            black_box(handle.finish().unwrap())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_reshape,
    bench_process_one_buffer,
    bench_pipeline_acquisition,
);

criterion_main!(benches);
