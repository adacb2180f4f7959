use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const STATS: [&str; 6] = ["hp", "attack", "defense", "sp_attack", "sp_defense", "speed"];

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

struct Row {
    name: String,
    type1: String,
    type2: String,
    generation: i64,
    stats: [f64; 6],
}

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    // Weighted by repetition so totals differ between types.
    let primaries = [
        "Water", "Water", "Water", "Normal", "Normal", "Grass", "Grass", "Fire", "Bug",
        "Psychic", "Electric", "Rock", "Dragon",
    ];
    let secondaries = ["None", "None", "None", "Flying", "Poison", "Ground", "Psychic", "Steel"];

    let mut rows = Vec::new();
    let mut id = 0;
    for generation in 1..=7i64 {
        let count = 20 + (rng.next_u64() % 25) as usize;
        for _ in 0..count {
            id += 1;
            let type1 = rng.pick(&primaries);
            let mut type2 = rng.pick(&secondaries);
            if type2 == type1 {
                type2 = "None";
            }
            // Later generations drift slightly stronger.
            let base = 60.0 + generation as f64 * 2.5;
            let mut stats = [0.0; 6];
            for s in &mut stats {
                *s = rng.gauss(base, 22.0).clamp(5.0, 200.0).round();
            }
            rows.push(Row {
                name: format!("Specimen {id:03}"),
                type1: type1.to_string(),
                type2: type2.to_string(),
                generation,
                stats,
            });
        }
    }
    // A generation with a single member exercises the empty-curve path.
    rows.push(Row {
        name: "Mr. Lonely".to_string(),
        type1: "Psychic".to_string(),
        type2: "Fairy".to_string(),
        generation: 8,
        stats: [70.0, 65.0, 65.0, 90.0, 90.0, 100.0],
    });
    rows
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng);

    let mut fields = vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("type1", DataType::Utf8, false),
        Field::new("type2", DataType::Utf8, false),
        Field::new("generation", DataType::Int64, false),
    ];
    fields.extend(STATS.iter().map(|s| Field::new(*s, DataType::Float64, true)));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<Arc<dyn arrow::array::Array>> = vec![
        Arc::new(StringArray::from(rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>())),
        Arc::new(StringArray::from(rows.iter().map(|r| r.type1.as_str()).collect::<Vec<_>>())),
        Arc::new(StringArray::from(rows.iter().map(|r| r.type2.as_str()).collect::<Vec<_>>())),
        Arc::new(Int64Array::from(rows.iter().map(|r| r.generation).collect::<Vec<_>>())),
    ];
    for k in 0..STATS.len() {
        columns.push(Arc::new(Float64Array::from(
            rows.iter().map(|r| r.stats[k]).collect::<Vec<_>>(),
        )));
    }

    let batch = RecordBatch::try_new(schema.clone(), columns)
        .expect("Failed to create RecordBatch");

    // Write Parquet
    let output_path = "sample_records.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    // Same rows as JSON records for quick inspection.
    let json: Vec<serde_json::Value> = rows
        .iter()
        .map(|r| {
            let mut obj = serde_json::Map::new();
            obj.insert("name".into(), r.name.clone().into());
            obj.insert("type1".into(), r.type1.clone().into());
            obj.insert("type2".into(), r.type2.clone().into());
            obj.insert("generation".into(), r.generation.into());
            for (k, s) in STATS.iter().enumerate() {
                obj.insert((*s).into(), r.stats[k].into());
            }
            serde_json::Value::Object(obj)
        })
        .collect();
    let json_path = "sample_records.json";
    let text = serde_json::to_string_pretty(&json).expect("Failed to serialize JSON");
    std::fs::write(json_path, text).expect("Failed to write JSON");

    // And as CSV.
    let csv_path = "sample_records.csv";
    let mut csv_writer = csv::Writer::from_path(csv_path).expect("Failed to create CSV");
    let mut header = vec!["name", "type1", "type2", "generation"];
    header.extend(STATS);
    csv_writer.write_record(&header).expect("Failed to write CSV header");
    for r in &rows {
        let mut fields = vec![
            r.name.clone(),
            r.type1.clone(),
            r.type2.clone(),
            r.generation.to_string(),
        ];
        fields.extend(r.stats.iter().map(|v| v.to_string()));
        csv_writer.write_record(&fields).expect("Failed to write CSV row");
    }
    csv_writer.flush().expect("Failed to flush CSV");

    println!(
        "Wrote {} records ({} numeric dimensions each) to {output_path}, {json_path} and {csv_path}",
        rows.len(),
        STATS.len()
    );
}
