use criterion::{Criterion, criterion_group, criterion_main};
use pageforge::html_rewrite::{RewriteContext, rewrite_page};
use pageforge::settings::Settings;

const SAMPLE_PAGE: &str = r#"<html>
<head>
<title>Sample</title>
<link rel="stylesheet" href="style.css">
<script src="analytics.js"></script>
</head>
<body>
<img src="hero.jpg">
<img src="body.jpg">
<iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ"></iframe>
<script src="app.js"></script>
</body>
</html>"#;

fn rewrite_bench(c: &mut Criterion) {
    let ctx = RewriteContext { settings: Settings::default(), ..Default::default() };
    c.bench_function("html_rewrite_pipeline", |b| {
        b.iter(|| rewrite_page(SAMPLE_PAGE, "https://example.com/", &ctx));
    });
}

criterion_group!(benches, rewrite_bench);
criterion_main!(benches);
