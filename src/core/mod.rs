pub mod annual;
pub mod book;
pub mod estate;
pub mod exemption;
pub mod gift;
pub mod input;
pub mod taper;
pub mod uk;
pub mod warnings;

// Flat public surface for domain types and functions.
pub use annual::AnnualExemptionState;
pub use book::{process_gifts, summarize, GiftBookSummary, ProcessedGift, TaxYearTotals};
pub use estate::{
    compute, residence_nil_rate_band, transferable_nrb_from_percentage, EstateError,
    EstateLiability, EstateSnapshot, FailedPet, GiftExposure, PetTreatment,
};
pub use exemption::{allocate, wedding_cap, Allocation, ExemptionAllocation, ExemptionType};
pub use gift::{
    AnnualClaim, ExemptionClaims, Gift, GiftError, GiftType, Relationship, StandardClaims,
};
pub use input::{
    read_csv, read_estate_json, read_json, CsvField, EstateInput, EstateItem, GiftBook,
    GiftBookInput, GiftRecord,
};
pub use taper::{classify, ReliefBand, TaperPosition};
pub use uk::TaxYear;
pub use warnings::Warning;
