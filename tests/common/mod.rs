use rand::Rng;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const EVENT_HEADER: [&str; 8] = [
    "type", "order", "method", "currency", "amount", "rate", "line", "reference",
];

/// Writes a session where every order pays part in cash and part in MXN.
///
/// The MXN tender is staged first, then both tender lines are added and the order
/// is committed. Returns the MXN amount staged for each order, in order.
pub fn generate_session_csv(path: &Path, orders: usize) -> Result<Vec<u64>, Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(EVENT_HEADER)?;

    let mut rng = rand::thread_rng();
    let mut staged = Vec::with_capacity(orders);
    for i in 1..=orders {
        let key = format!("uuid-{i}");
        let mxn: u64 = rng.gen_range(20..=2000);
        // 0.05 USD per MXN keeps every base amount exact to the cent.
        let base = format!("{:.2}", mxn as f64 * 0.05);

        let amount = mxn.to_string();
        let reference = format!("Order {i:04}");
        let key = key.as_str();

        wtr.write_record(["stage", key, "2", "2", amount.as_str(), "0.05", "", ""])?;
        wtr.write_record(["pay", key, "1", "", "1.00", "", "", ""])?;
        wtr.write_record(["pay", key, "2", "", base.as_str(), "", "", ""])?;
        wtr.write_record(["commit", key, "", "", "", "", "", reference.as_str()])?;
        staged.push(mxn);
    }

    wtr.flush()?;
    Ok(staged)
}
