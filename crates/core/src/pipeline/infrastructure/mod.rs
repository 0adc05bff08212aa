pub mod threaded_dataset_executor;
