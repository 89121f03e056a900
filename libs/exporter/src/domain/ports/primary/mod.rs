pub mod export_documents;
