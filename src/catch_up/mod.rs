mod collaborators;
mod locks;
mod processor;
mod settings;

pub use collaborators::{
    Conversion, CurrencyRateResolver, RecurringItemStore, TransactionDraft, TransactionMaterializer,
};
pub use processor::{Mode, PassReport, ProcessError, Processor};
pub use settings::CatchUpSettings;
