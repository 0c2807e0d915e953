mod test_buffered_candidates_capped;
mod test_candidates_buffered_until_description;
mod test_early_candidates_adopted;
