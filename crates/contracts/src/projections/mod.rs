pub mod p900_dataset_preview;
