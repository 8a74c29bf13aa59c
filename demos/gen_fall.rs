//! Generate fall.event.v1 output for validation testing

fn main() {
    // 2s standing, one impact, then lying still for 6s at 10ms sampling
    let mut samples = Vec::new();
    for i in 0..800u64 {
        let t_ms = i * 10;
        let z = match t_ms {
            0..=1999 => 1.0,
            2000..=2009 => 8.0,
            _ => 0.98,
        };
        samples.push(serde_json::json!({ "t_ms": t_ms, "x": 0.02, "y": -0.01, "z": z }));
    }

    let json = serde_json::Value::Array(samples).to_string();

    match synheart_fall::samples_to_fall_events(json, "demo-device".to_string()) {
        Ok(events) => {
            for event in events {
                println!("{event}");
            }
        }
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
