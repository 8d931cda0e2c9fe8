//! # Rubrica CLI
//!
//! Usage:
//!   rubrica input.json [-o output.pdf] [--date YYYY-MM-DD|all] [--config config.json]
//!   echo '{ ... }' | rubrica -o output.pdf
//!   rubrica --example > evaluaciones.json
//!
//! Without `-o` the PDF is written to the report's own file name, e.g.
//! `evaluaciones_todas.pdf`. Set `RUST_LOG` for diagnostics on stderr.

use std::env;
use std::fs;
use std::io::{self, Read};

use rubrica::{DateFilter, Report, ReportConfig, ReportError};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_input_json());
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), ReportError> {
    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1])?
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    };

    let config = match flag_value(args, "--config") {
        Some(path) => ReportConfig::from_json(&fs::read_to_string(path)?)?,
        None => ReportConfig::default(),
    };
    let filter = flag_value(args, "--date")
        .map(DateFilter::parse)
        .unwrap_or_default();

    let report = Report::new(config)?.render_json(&input, &filter)?;

    let output_path = flag_value(args, "-o")
        .map(str::to_string)
        .unwrap_or_else(|| report.file_name.clone());
    fs::write(&output_path, &report.bytes)?;
    eprintln!(
        "✓ Written {} pages ({} bytes) to {}",
        report.page_count,
        report.bytes.len(),
        output_path
    );
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn example_input_json() -> &'static str {
    r##"{
  "title": "INFORME DE EVALUACIÓN CONTINUA",
  "items": [
    {
      "letra": "A",
      "descripcion": "Comprende el sentido global de textos orales y escritos de su entorno.",
      "nivel_1": "Identifica algunas ideas con ayuda constante.",
      "nivel_2": "Identifica las ideas principales con ayuda puntual.",
      "nivel_3": "Identifica ideas principales y secundarias de forma autónoma.",
      "nivel_4": "Resume y valora críticamente el contenido del texto."
    },
    {
      "letra": "B",
      "descripcion": "Produce textos escritos adecuados, coherentes y cohesionados.",
      "nivel_1": "Textos breves con errores que dificultan la comprensión.",
      "nivel_2": "Textos comprensibles con errores frecuentes.",
      "nivel_3": "Textos correctos con errores ocasionales.",
      "nivel_4": "Textos ricos, bien organizados y sin errores."
    },
    {
      "letra": "C",
      "descripcion": "Participa en interacciones orales respetando las normas.",
      "nivel_1": "None",
      "nivel_2": "Participa cuando se le pide.",
      "nivel_3": "Participa por iniciativa propia.",
      "nivel_4": "Modera y dinamiza la conversación."
    }
  ],
  "evaluations": [
    { "nombre_alumno": "Ana García (1ºA)", "puntos": { "A": 3, "B": 2, "C": 4 }, "fecha": "2024-03-05" },
    { "nombre_alumno": "Luis Pérez (1ºA)", "puntos": { "A": "1", "B": 2, "C": 2 }, "fecha": "2024-03-05" },
    { "nombre_alumno": "Marta Ruiz (1ºB)", "puntos": "{\"A\": 4, \"B\": 4, \"C\": 3}", "fecha": "2024-03-05T09:30:00+00:00" },
    { "nombre_alumno": "Jorge Sanz (1ºB)", "puntos": { "A": 2, "B": 3 }, "fecha": "2024-03-12" }
  ]
}
"##
}
