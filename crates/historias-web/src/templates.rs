//! HTML templates, compiled into the binary and rendered with minijinja.
//! Names ending in `.html` are auto-escaped.

use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;
use std::sync::OnceLock;

static ENVIRONMENT: OnceLock<Environment<'static>> = OnceLock::new();

fn source(name: &str) -> Option<&'static str> {
    let src = match name {
        "base.html" => include_str!("../templates/base.html"),
        "nav.html" => include_str!("../templates/nav.html"),
        "historias.html" => include_str!("../templates/historias.html"),
        "detalle.html" => include_str!("../templates/detalle.html"),
        "feedback.html" => include_str!("../templates/feedback.html"),
        "metricas.html" => include_str!("../templates/metricas.html"),
        "grafica.html" => include_str!("../templates/grafica.html"),
        "chart.html" => include_str!("../templates/chart.html"),
        "estado.html" => include_str!("../templates/estado.html"),
        _ => return None,
    };
    Some(src)
}

pub fn environment() -> &'static Environment<'static> {
    ENVIRONMENT.get_or_init(|| {
        let mut env = Environment::new();
        env.set_loader(|name| Ok(source(name).map(str::to_string)));
        env
    })
}

pub fn render<S: Serialize>(name: &str, ctx: S) -> Result<Html<String>, minijinja::Error> {
    let template = environment().get_template(name)?;
    Ok(Html(template.render(ctx)?))
}
