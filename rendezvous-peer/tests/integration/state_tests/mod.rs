mod test_remote_renegotiation_stays_connected;
