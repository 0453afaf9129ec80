// SPDX-License-Identifier: Apache-2.0 OR MIT
#![cfg_attr(not(feature = "telemetry"), allow(dead_code))]

#[cfg(feature = "telemetry")]
mod otel {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::OnceLock;
    use std::time::Duration;

    use opentelemetry::global;
    use opentelemetry::metrics::{Counter, Histogram};
    use opentelemetry::trace::SpanKind;
    use opentelemetry::{trace::Span, trace::Tracer, KeyValue};

    const METER_NAME: &str = "quicktpl_compiler";
    const TRACER_NAME: &str = "quicktpl_compiler";

    static ENABLED: AtomicBool = AtomicBool::new(false);
    static HANDLES: OnceLock<Handles> = OnceLock::new();

    struct Handles {
        tracer: opentelemetry::global::BoxedTracer,
        compile_hist: Histogram<f64>,
        compile_counter: Counter<u64>,
        function_counter: Counter<u64>,
    }

    impl Handles {
        fn new() -> Self {
            let meter = global::meter(METER_NAME);
            let compile_hist = meter
                .f64_histogram("quicktpl.compile.duration_ms")
                .with_description("Template compile duration in milliseconds")
                .init();
            let compile_counter = meter
                .u64_counter("quicktpl.compile.count")
                .with_description("Number of compiled templates")
                .init();
            let function_counter = meter
                .u64_counter("quicktpl.function.count")
                .with_description("Number of generated template functions")
                .init();
            let tracer = global::tracer(TRACER_NAME);
            Self {
                tracer,
                compile_hist,
                compile_counter,
                function_counter,
            }
        }
    }

    fn handles() -> &'static Handles {
        HANDLES.get_or_init(Handles::new)
    }

    pub fn enable() {
        ENABLED.store(true, Ordering::Relaxed);
    }

    pub fn disable() {
        ENABLED.store(false, Ordering::Relaxed);
    }

    fn enabled() -> bool {
        ENABLED.load(Ordering::Relaxed)
    }

    pub fn record_compile(file_path: &str, source_len: usize, duration: Duration, success: bool) {
        if !enabled() {
            return;
        }
        let hs = handles();
        let duration_ms = duration.as_secs_f64() * 1_000.0;
        let attrs = [
            KeyValue::new("template.path", file_path.to_string()),
            KeyValue::new("template.length", source_len as i64),
            KeyValue::new("compile.success", success),
        ];
        hs.compile_counter.add(1, &attrs);
        hs.compile_hist.record(duration_ms, &attrs);
        let mut span = hs
            .tracer
            .span_builder("quicktpl::compile")
            .with_kind(SpanKind::Internal)
            .start(&hs.tracer);
        span.set_attribute(KeyValue::new("template.path", file_path.to_string()));
        span.set_attribute(KeyValue::new("template.length", source_len as i64));
        span.set_attribute(KeyValue::new("compile.duration_ms", duration_ms));
        span.set_attribute(KeyValue::new("compile.success", success));
        span.end();
    }

    pub fn record_function(name: &str) {
        if !enabled() {
            return;
        }
        let hs = handles();
        let attrs = [KeyValue::new("function.name", name.to_string())];
        hs.function_counter.add(1, &attrs);
    }
}

#[cfg(not(feature = "telemetry"))]
mod otel {
    use std::time::Duration;

    pub fn enable() {}
    pub fn disable() {}
    pub fn record_compile(
        _file_path: &str,
        _source_len: usize,
        _duration: Duration,
        _success: bool,
    ) {
    }

    pub fn record_function(_name: &str) {}
}

pub use otel::{disable, enable, record_compile, record_function};
