use serde::Serialize;

/// One entry of the traffic-code violation catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub code: &'static str,
    pub description: &'static str,
}

/// The fixed external violation catalog
pub const VIOLATION_CATALOG: &[Violation] = &[
    Violation {
        code: "12.9 ч.1",
        description: "Превышение скорости на 20-40 км/ч",
    },
    Violation {
        code: "12.9 ч.2",
        description: "Превышение скорости на 40-60 км/ч",
    },
    Violation {
        code: "12.9 ч.3",
        description: "Превышение скорости на 60-80 км/ч",
    },
    Violation {
        code: "12.12 ч.1",
        description: "Проезд на запрещающий сигнал светофора",
    },
    Violation {
        code: "12.12 ч.2",
        description: "Выезд за стоп-линию",
    },
    Violation {
        code: "12.15 ч.1",
        description: "Нарушение правил расположения ТС на проезжей части",
    },
    Violation {
        code: "12.15 ч.2",
        description: "Движение по обочине",
    },
    Violation {
        code: "12.16 ч.1",
        description: "Несоблюдение требований дорожной разметки",
    },
    Violation {
        code: "12.19 ч.1",
        description: "Нарушение правил остановки и стоянки",
    },
];

pub fn lookup(code: &str) -> Option<&'static Violation> {
    VIOLATION_CATALOG.iter().find(|v| v.code == code)
}

pub fn is_known(code: &str) -> bool {
    lookup(code).is_some()
}

/// Deduplicate a list of codes, keeping first occurrences in order.
pub fn dedup_codes<S: AsRef<str>>(codes: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(codes.len());
    for code in codes {
        let code = code.as_ref().trim();
        if !code.is_empty() && !out.iter().any(|c| c == code) {
            out.push(code.to_string());
        }
    }
    out
}
