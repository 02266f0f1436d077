//! Estate command - IHT on the estate if death occurred on the as-of date

use super::{
    as_of_or_today, format_gbp, format_pct, process_book, read_estate, read_gifts,
    PetTreatmentArg,
};
use chrono::NaiveDate;
use clap::Args;
use ihtc::core::{compute, summarize, EstateInput, EstateLiability, GiftExposure, PetTreatment};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct EstateCommand {
    /// JSON file describing the estate (overrides the value flags)
    #[arg(
        short,
        long,
        conflicts_with_all = ["net_estate", "transferable_nrb", "transferable_nrb_pct"]
    )]
    estate: Option<PathBuf>,

    /// Net estate value after liabilities
    #[arg(long, required_unless_present = "estate")]
    net_estate: Option<Decimal>,

    /// Nil-rate band transferred from a late spouse
    #[arg(long, conflicts_with = "transferable_nrb_pct")]
    transferable_nrb: Option<Decimal>,

    /// Percentage of a late spouse's nil-rate band left unused (0-100)
    #[arg(long)]
    transferable_nrb_pct: Option<Decimal>,

    /// Residence passes to direct descendants
    #[arg(long)]
    rnrb: bool,

    /// Share of the estate left to charity, as a percentage
    #[arg(long, default_value = "0")]
    charity_pct: Decimal,

    /// CSV or JSON file of lifetime gifts to include
    #[arg(short, long)]
    gifts: Option<PathBuf>,

    /// How failed PETs interact with the nil-rate band
    #[arg(long, value_enum, default_value_t = PetTreatmentArg::Separate)]
    pets: PetTreatmentArg,

    /// Date of the hypothetical death (default today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Annual exemption used in the tax year before the first gift
    #[arg(long)]
    prior_year_used: Option<Decimal>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// Estate liability with the gift exposure that fed it, for JSON output
#[derive(Debug, Serialize)]
struct EstateOutput {
    as_of: String,
    chargeable_pets: Decimal,
    estate: EstateLiability,
}

impl EstateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let as_of = as_of_or_today(self.as_of);
        let snapshot = match &self.estate {
            Some(path) => read_estate(path)?,
            None => EstateInput {
                net_estate: self.net_estate,
                transferable_nrb: self.transferable_nrb,
                transferable_nrb_percentage: self.transferable_nrb_pct,
                rnrb_eligible: self.rnrb,
                charitable_gift_percentage: self.charity_pct,
                ..Default::default()
            }
            .to_snapshot()?,
        };

        let treatment: PetTreatment = self.pets.into();
        let exposure = match &self.gifts {
            Some(path) => {
                let book = read_gifts(path)?;
                let processed = process_book(&book, self.prior_year_used, as_of)?;
                summarize(&processed, as_of).exposure(treatment)
            }
            None => GiftExposure {
                pets: Vec::new(),
                treatment,
            },
        };

        let liability = compute(&snapshot, &exposure);

        if self.json {
            let output = EstateOutput {
                as_of: as_of.format("%Y-%m-%d").to_string(),
                chargeable_pets: exposure.chargeable_pets(),
                estate: liability,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!();
        println!("ESTATE (death on {})", as_of.format("%Y-%m-%d"));
        println!();
        print_estate_liability(&liability, self.gifts.is_some());
        if self.gifts.is_some() {
            println!("  Failed PETs: {}", format_gbp(exposure.chargeable_pets()));
            println!("TOTAL IHT: {}", format_gbp(liability.total_tax_liability));
            println!();
        }
        Ok(())
    }
}

/// Print the nil-rate band breakdown and the estate's tax
pub fn print_estate_liability(liability: &EstateLiability, with_gifts: bool) {
    println!("ESTATE LIABILITY");
    println!("  Net estate: {}", format_gbp(liability.net_estate));
    if liability.nrb_used_by_gifts > Decimal::ZERO {
        println!(
            "  Nil-rate band: {} ({} used by gifts, {} available)",
            format_gbp(liability.total_nrb),
            format_gbp(liability.nrb_used_by_gifts),
            format_gbp(liability.available_nrb)
        );
    } else {
        println!("  Nil-rate band: {}", format_gbp(liability.total_nrb));
    }
    println!("  Residence nil-rate band: {}", format_gbp(liability.total_rnrb));
    println!(
        "  Chargeable: {} @ {}",
        format_gbp(liability.chargeable_estate),
        format_pct(liability.rate)
    );
    println!("  Estate IHT: {}", format_gbp(liability.net_tax_liability));
    if with_gifts {
        println!(
            "  IHT on gifts (after taper): {}",
            format_gbp(liability.gift_tax_after_nrb)
        );
    }
    println!();
}
