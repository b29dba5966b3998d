//! Optional export of recorded chains, gated behind the `csv` cargo feature.

#[cfg(feature = "csv")]
use crate::stats::McmcResult;
#[cfg(feature = "csv")]
use csv::Writer;
#[cfg(feature = "csv")]
use std::error::Error;

#[cfg(feature = "csv")]
/// Saves one or more recorded chains as a CSV file with the columns
/// `chain`, `sample`, `value`, and `accepted`.
///
/// # Examples
///
/// ```rust
/// # use multilevel_mcmc::io::save_csv;
/// # use multilevel_mcmc::stats::McmcResult;
/// let mut result = McmcResult::new();
/// result.add_sample(0.5, true);
/// save_csv(&[result], "/tmp/chain.csv")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn save_csv(chains: &[McmcResult], filename: &str) -> Result<(), Box<dyn Error>> {
    let mut writer = Writer::from_path(filename)?;
    writer.write_record(["chain", "sample", "value", "accepted"])?;

    for (chain_idx, chain) in chains.iter().enumerate() {
        for (sample_idx, (value, accepted)) in
            chain.samples.iter().zip(chain.accepted.iter()).enumerate()
        {
            writer.write_record(&[
                chain_idx.to_string(),
                sample_idx.to_string(),
                value.to_string(),
                accepted.to_string(),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}
