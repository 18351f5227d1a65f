use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rust_xlsxwriter::{Format, FormatBorder, Workbook};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Elisa", "Fábio", "Gabriela", "Heitor", "Isabela", "João",
    "Larissa", "Marcos", "Natália", "Otávio", "Paula", "Rafael", "Sônia", "Tiago",
];
const LAST_NAMES: &[&str] = &[
    "Silva", "Santos", "Oliveira", "Souza", "Lima", "Pereira", "Costa", "Almeida", "Ferreira",
];
// Mixed spellings on purpose: the dashboard matches them case-insensitively.
const YES: &[&str] = &["SIM", "Sim", "sim"];
const NO: &[&str] = &["NAO", "Não", "nao"];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let n_rows = 250;
    let oldest = NaiveDate::from_ymd_opt(1945, 1, 1).context("invalid start date")?;
    let span_days = 365 * 60;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Candidatos")?;

    let header = Format::new().set_bold().set_border(FormatBorder::Thin);
    let date = Format::new().set_num_format("dd/mm/yyyy");

    let columns = ["INSCRICAO", "NOME", "NASCIMENTO", "NEGRO", "DEFICIENTE", "NOTA"];
    for (col, name) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }

    for i in 0..n_rows {
        let row = i as u32 + 1;
        let name = format!("{} {}", rng.pick(FIRST_NAMES), rng.pick(LAST_NAMES));
        let birth = oldest + Duration::days((rng.next_f64() * span_days as f64) as i64);

        sheet.write_number(row, 0, 20240000.0 + i as f64)?;
        sheet.write_string(row, 1, name)?;
        if rng.chance(0.1) {
            // Some sheets carry birth dates as typed text, some are unreadable.
            let text = if rng.chance(0.5) {
                birth.format("%Y-%m-%d").to_string()
            } else {
                "não informado".to_string()
            };
            sheet.write_string(row, 2, text)?;
        } else {
            sheet.write_datetime_with_format(row, 2, &birth, &date)?;
        }
        if !rng.chance(0.05) {
            let flag = if rng.chance(0.3) { rng.pick(YES) } else { rng.pick(NO) };
            sheet.write_string(row, 3, flag)?;
        }
        let flag = if rng.chance(0.15) { rng.pick(YES) } else { rng.pick(NO) };
        sheet.write_string(row, 4, flag)?;
        sheet.write_number(row, 5, (rng.next_f64() * 1000.0).round() / 100.0)?;
    }

    let output_path = "sample_candidatos.xlsx";
    workbook
        .save(output_path)
        .with_context(|| format!("writing {output_path}"))?;

    println!("Wrote {n_rows} candidates to {output_path}");
    Ok(())
}
